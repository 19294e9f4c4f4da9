//! Scrape stage: batched profile fetches with a cumulative checkpoint.

use tracing::{info, warn};

use crate::error::Result;
use crate::traits::scraper::ProfileScraper;
use crate::traits::store::{CandidateQuery, SourcingStore};
use crate::types::config::PipelineConfig;
use crate::types::job::{JobStage, SourcingJob};

/// Scrape the contactable profiles in fixed-size batches.
///
/// After each batch the full accumulated outcome list (successes and
/// failures together) is persisted as the checkpoint blob along with the
/// derived succeeded count, so a resumed run retries only URLs not yet
/// marked succeeded. A batch-level provider failure is logged into the
/// job's error message and the loop continues with the next batch; partial
/// success beats all-or-nothing.
pub async fn run_scrape<S: SourcingStore>(
    job: &mut SourcingJob,
    store: &S,
    scraper: &dyn ProfileScraper,
    config: &PipelineConfig,
) -> Result<()> {
    let mut checkpoint = job.scrape_checkpoint.clone().unwrap_or_default();
    let done = checkpoint.succeeded_urls();

    // Only profiles that passed the contact gate are worth scrape budget.
    let candidates = store
        .get_candidates(job.id, &CandidateQuery::default())
        .await?;
    let pending: Vec<String> = candidates
        .into_iter()
        .map(|c| c.profile_url)
        .filter(|url| !done.contains(url))
        .collect();

    info!(
        job_id = %job.id,
        pending = pending.len(),
        already_scraped = done.len(),
        "starting scrape"
    );

    for batch in pending.chunks(config.scrape_batch_size) {
        match scraper.scrape_batch(batch).await {
            Ok(outcomes) => {
                for outcome in outcomes {
                    checkpoint.upsert(outcome);
                }
            }
            Err(e) => {
                warn!(job_id = %job.id, batch_len = batch.len(), error = %e, "scrape batch failed");
                job.record_error(
                    JobStage::Scrape,
                    format!("scrape batch failed: {e}"),
                    true,
                );
            }
        }

        checkpoint.recount();
        job.progress.scraped = checkpoint.succeeded;
        job.scrape_checkpoint = Some(checkpoint.clone());
        job.touch();
        store.update_job(job).await?;
    }

    info!(
        job_id = %job.id,
        succeeded = checkpoint.succeeded,
        attempted = checkpoint.profiles.len(),
        "scrape complete"
    );

    Ok(())
}
