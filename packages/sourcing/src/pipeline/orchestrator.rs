//! The pipeline state machine.
//!
//! Every transition is driven by data in the job store (counts, attempt
//! index, stage label), never by in-memory continuation. A crashed and
//! restarted orchestrator reloads the job and resumes at the recorded
//! stage, and each stage's own checkpoints make re-entering it safe.

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{Result, SourcingError};
use crate::pipeline::enrich::run_enrich;
use crate::pipeline::parse::run_parse;
use crate::pipeline::queries::generate_query_variants;
use crate::pipeline::save::run_save;
use crate::pipeline::score::run_score;
use crate::pipeline::scrape::run_scrape;
use crate::pipeline::search::run_search;
use crate::traits::ai::{CandidateScorer, ProfileExtractor, RequirementsFormatter};
use crate::traits::enricher::ContactEnricher;
use crate::traits::scraper::ProfileScraper;
use crate::traits::searcher::ProfileSearcher;
use crate::traits::store::SourcingStore;
use crate::types::config::PipelineConfig;
use crate::types::job::{JobStage, JobStatus, SourcingJob};
use crate::types::requirements::SearchFilters;

/// The external collaborators one pipeline execution needs.
pub struct Adapters<'a> {
    pub formatter: &'a dyn RequirementsFormatter,
    pub searcher: &'a dyn ProfileSearcher,
    pub enricher: &'a dyn ContactEnricher,
    pub scraper: &'a dyn ProfileScraper,
    pub extractor: &'a dyn ProfileExtractor,
    pub scorer: &'a dyn CandidateScorer,
}

/// Message surfaced on jobs that exhausted every search variant.
pub const NO_CANDIDATES_MESSAGE: &str =
    "no qualifying candidates found after exhausting all search variants";

/// Pure transition function: where the machine goes after the current
/// stage completes, given only job-store data.
///
/// The interesting branch is after ENRICH: enough contactable candidates
/// means scrape; otherwise loop back to search with the next fallback
/// variant while attempts remain; otherwise resolve to the distinct
/// `NoCandidates` terminal so callers can suggest broader requirements
/// instead of reporting a system error.
pub fn next_stage(job: &SourcingJob, config: &PipelineConfig) -> JobStage {
    match job.stage {
        JobStage::Formatting => JobStage::QueryGen,
        JobStage::QueryGen => JobStage::Search,
        JobStage::Search => JobStage::Enrich,
        JobStage::Enrich => {
            if job.candidates_with_contact >= job.max_candidates {
                JobStage::Scrape
            } else if job.search_iterations < config.max_search_iterations
                && job.variant_index + 1 < job.query_variants.len()
            {
                JobStage::Search
            } else {
                JobStage::NoCandidates
            }
        }
        JobStage::Scrape => JobStage::Parse,
        JobStage::Parse => JobStage::Save,
        JobStage::Save => JobStage::Score,
        JobStage::Score => JobStage::Completed,
        terminal => terminal,
    }
}

/// Derive structured requirements unless the job already carries them.
async fn run_formatting<S: SourcingStore>(
    job: &mut SourcingJob,
    store: &S,
    formatter: &dyn RequirementsFormatter,
) -> Result<()> {
    if job.description.trim().is_empty() {
        return Err(SourcingError::InvalidJob {
            reason: "job description is empty".into(),
        });
    }

    if job.requirements.is_none() {
        let requirements = formatter.format_requirements(&job.description).await?;
        info!(job_id = %job.id, titles = requirements.titles.len(), "requirements derived");
        job.requirements = Some(requirements);
    }

    job.touch();
    store.update_job(job).await
}

/// Derive search filters and the query-variant ladder.
async fn run_query_gen<S: SourcingStore>(job: &mut SourcingJob, store: &S) -> Result<()> {
    let requirements = job
        .requirements
        .clone()
        .ok_or_else(|| SourcingError::InvalidJob {
            reason: "query generation requires derived requirements".into(),
        })?;

    // A resumed job keeps the variants the original run derived so its
    // variant index stays valid.
    if job.query_variants.is_empty() {
        job.filters = Some(SearchFilters::from_requirements(&requirements));
        job.query_variants = generate_query_variants(&requirements);
    }

    job.touch();
    store.update_job(job).await
}

async fn run_stage<S: SourcingStore>(
    job: &mut SourcingJob,
    store: &S,
    adapters: &Adapters<'_>,
    config: &PipelineConfig,
) -> Result<()> {
    match job.stage {
        JobStage::Formatting => run_formatting(job, store, adapters.formatter).await,
        JobStage::QueryGen => run_query_gen(job, store).await,
        JobStage::Search => run_search(job, store, adapters.searcher, config).await,
        JobStage::Enrich => run_enrich(job, store, adapters.enricher, config).await,
        JobStage::Scrape => run_scrape(job, store, adapters.scraper, config).await,
        JobStage::Parse => run_parse(job, store, adapters.extractor, config).await,
        JobStage::Save => run_save(job, store, config).await,
        JobStage::Score => run_score(job, store, adapters.scorer, config).await,
        JobStage::Completed | JobStage::NoCandidates | JobStage::Failed => Ok(()),
    }
}

/// Apply a computed transition, including its terminal side effects.
fn apply_transition(job: &mut SourcingJob, next: JobStage) {
    if job.stage == JobStage::Enrich && next == JobStage::Search {
        job.advance_variant();
    }

    match next {
        JobStage::Completed => {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
        }
        JobStage::NoCandidates => {
            job.status = JobStatus::Failed;
            job.error_message = Some(NO_CANDIDATES_MESSAGE.to_string());
            job.completed_at = Some(Utc::now());
        }
        _ => {}
    }

    info!(job_id = %job.id, from = %job.stage, to = %next, "stage transition");
    job.stage = next;
    job.touch();
}

/// Drive one job from its current stage to a terminal state.
///
/// Safe to call again after any failure or restart: the loop reloads the
/// job each iteration and every stage skips work its checkpoints already
/// cover. Stage-level transient errors leave the stage label in place,
/// mark the job failed for visibility, and return the error; a later call
/// resumes exactly there. Non-retryable errors drive the stage to
/// `Failed`.
pub async fn run_job<S: SourcingStore>(
    job_id: Uuid,
    store: &S,
    adapters: &Adapters<'_>,
    config: &PipelineConfig,
) -> Result<JobStatus> {
    loop {
        let mut job = store
            .get_job(job_id)
            .await?
            .ok_or(SourcingError::JobNotFound { id: job_id })?;

        if job.stage.is_terminal() {
            return Ok(job.status);
        }

        if job.status != JobStatus::Running {
            job.status = JobStatus::Running;
            store.update_job(&job).await?;
        }

        match run_stage(&mut job, store, adapters, config).await {
            Ok(()) => {
                let next = next_stage(&job, config);
                apply_transition(&mut job, next);
                store.update_job(&job).await?;
            }
            Err(e) if e.is_retryable() => {
                warn!(job_id = %job_id, stage = %job.stage, error = %e, "stage failed, job is re-runnable");
                job.record_error(job.stage, e.to_string(), true);
                job.status = JobStatus::Failed;
                job.touch();
                store.update_job(&job).await?;
                return Err(e);
            }
            Err(e) => {
                error!(job_id = %job_id, stage = %job.stage, error = %e, "fatal error, job failed");
                job.record_error(job.stage, e.to_string(), false);
                job.stage = JobStage::Failed;
                job.status = JobStatus::Failed;
                job.completed_at = Some(Utc::now());
                job.touch();
                store.update_job(&job).await?;
                return Err(e);
            }
        }
    }
}

/// Create and persist a job, returning its id. The caller then drives it
/// with [`run_job`].
pub async fn submit_job<S: SourcingStore>(
    store: &S,
    owner_id: Uuid,
    description: impl Into<String>,
    max_candidates: usize,
) -> Result<Uuid> {
    let job = SourcingJob::new(owner_id, description, max_candidates);
    store.create_job(&job).await?;
    Ok(job.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::requirements::{JobRequirements, QueryVariant, VariantKind};

    fn variant(kind: VariantKind) -> QueryVariant {
        QueryVariant {
            kind,
            keywords: vec![],
            titles: vec![],
            location: None,
            industry: None,
        }
    }

    fn job_after_enrich(contactable: usize, iterations: u32, variants: usize) -> SourcingJob {
        let mut job = SourcingJob::new(Uuid::new_v4(), "desc", 50)
            .with_requirements(JobRequirements::default());
        job.stage = JobStage::Enrich;
        job.candidates_with_contact = contactable;
        job.search_iterations = iterations;
        job.query_variants = (0..variants).map(|_| variant(VariantKind::Precise)).collect();
        job
    }

    #[test]
    fn linear_stages_advance_in_order() {
        let config = PipelineConfig::default();
        let mut job = SourcingJob::new(Uuid::new_v4(), "desc", 10);

        let expected = [
            (JobStage::Formatting, JobStage::QueryGen),
            (JobStage::QueryGen, JobStage::Search),
            (JobStage::Search, JobStage::Enrich),
            (JobStage::Scrape, JobStage::Parse),
            (JobStage::Parse, JobStage::Save),
            (JobStage::Save, JobStage::Score),
            (JobStage::Score, JobStage::Completed),
        ];
        for (from, to) in expected {
            job.stage = from;
            assert_eq!(next_stage(&job, &config), to);
        }
    }

    #[test]
    fn enough_candidates_proceeds_to_scrape() {
        let config = PipelineConfig::default();
        let job = job_after_enrich(50, 1, 4);
        assert_eq!(next_stage(&job, &config), JobStage::Scrape);
    }

    #[test]
    fn short_pool_loops_back_to_search() {
        // 45 of 50 after the precise variant: one more search iteration.
        let config = PipelineConfig::default();
        let job = job_after_enrich(45, 1, 4);
        assert_eq!(next_stage(&job, &config), JobStage::Search);
    }

    #[test]
    fn exhausted_iterations_resolve_to_no_candidates() {
        let config = PipelineConfig::default();
        let job = job_after_enrich(45, 3, 4);
        assert_eq!(next_stage(&job, &config), JobStage::NoCandidates);
    }

    #[test]
    fn exhausted_variants_resolve_to_no_candidates() {
        let config = PipelineConfig::default();
        let mut job = job_after_enrich(10, 2, 3);
        job.variant_index = 2;
        assert_eq!(next_stage(&job, &config), JobStage::NoCandidates);
    }

    #[test]
    fn terminal_stages_are_absorbing() {
        let config = PipelineConfig::default();
        for terminal in [JobStage::Completed, JobStage::NoCandidates, JobStage::Failed] {
            let mut job = SourcingJob::new(Uuid::new_v4(), "desc", 10);
            job.stage = terminal;
            assert_eq!(next_stage(&job, &config), terminal);
        }
    }

    #[test]
    fn loop_transition_advances_the_variant() {
        let mut job = job_after_enrich(45, 1, 4);
        assert_eq!(job.variant_index, 0);
        apply_transition(&mut job, JobStage::Search);
        assert_eq!(job.variant_index, 1);
        assert_eq!(job.stage, JobStage::Search);
    }

    #[test]
    fn no_candidates_transition_marks_failure_with_distinct_message() {
        let mut job = job_after_enrich(0, 3, 4);
        apply_transition(&mut job, JobStage::NoCandidates);
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.stage, JobStage::NoCandidates);
        assert_eq!(job.error_message.as_deref(), Some(NO_CANDIDATES_MESSAGE));
        assert!(job.completed_at.is_some());
    }
}
