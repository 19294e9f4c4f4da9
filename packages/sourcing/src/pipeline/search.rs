//! Search stage: execute one query variant and union the results.

use tracing::{info, warn};
use url::Url;

use crate::error::{Result, SourcingError};
use crate::traits::searcher::ProfileSearcher;
use crate::traits::store::SourcingStore;
use crate::types::config::PipelineConfig;
use crate::types::job::{JobStage, SourcingJob};

/// Execute the current query variant and merge returned profile URLs into
/// the job's accumulated set.
///
/// The merge is a set union: duplicates across variants collapse. A failed
/// provider call is recorded as retryable and leaves the stored URL set
/// untouched (partial accumulation from a failed call is discarded, never
/// half-merged). Either way the attempt counter advances and the job is
/// persisted exactly once, so the orchestrator's branching always sees a
/// consistent row.
pub async fn run_search<S: SourcingStore>(
    job: &mut SourcingJob,
    store: &S,
    searcher: &dyn ProfileSearcher,
    config: &PipelineConfig,
) -> Result<()> {
    let variant = job
        .current_variant()
        .cloned()
        .ok_or_else(|| SourcingError::InvalidJob {
            reason: "no query variant to execute".into(),
        })?;

    job.search_iterations += 1;

    match searcher.search(&variant, config.search_page_size).await {
        Ok(hits) => {
            let before = job.profile_urls.len();
            for hit in hits {
                if Url::parse(&hit.profile_url).is_err() {
                    warn!(url = %hit.profile_url, "discarding malformed profile URL");
                    continue;
                }
                job.profile_urls.insert(hit.profile_url);
            }
            job.progress.found = job.profile_urls.len();
            info!(
                job_id = %job.id,
                variant = ?variant.kind,
                iteration = job.search_iterations,
                new_urls = job.profile_urls.len() - before,
                total_urls = job.profile_urls.len(),
                "search variant complete"
            );
        }
        Err(e) => {
            warn!(job_id = %job.id, variant = ?variant.kind, error = %e, "search variant failed");
            job.record_error(
                JobStage::Search,
                format!("search failed for {:?} variant: {e}", variant.kind),
                true,
            );
        }
    }

    job.touch();
    store.update_job(job).await
}
