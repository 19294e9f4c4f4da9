//! Bounded-concurrency settle-all combinator.
//!
//! Several stages fan a batch out to slow model calls and need every
//! outcome back, success or failure, with one item's error never
//! cancelling sibling work. `settle_all` is that primitive: a worker
//! limit via semaphore, results collected in input order.

use futures::future;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::Result;

/// Run every task with at most `concurrency` in flight, collecting all
/// outcomes.
///
/// Output order matches input order even though completion order does not;
/// callers checkpoint only after the whole batch has settled, which keeps
/// checkpoint writes totally ordered.
pub async fn settle_all<I, F, T>(tasks: I, concurrency: usize) -> Vec<Result<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let wrapped = tasks.into_iter().map(|task| {
        let semaphore = Arc::clone(&semaphore);
        async move {
            let _permit = semaphore.acquire().await.unwrap();
            task.await
        }
    });
    future::join_all(wrapped).await
}
