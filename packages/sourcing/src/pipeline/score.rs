//! Score stage: concurrent rubric scoring of saved candidates.

use tracing::{info, warn};

use crate::error::{Result, SourcingError};
use crate::pipeline::batch::settle_all;
use crate::traits::ai::CandidateScorer;
use crate::traits::store::SourcingStore;
use crate::types::candidate::CandidateScore;
use crate::types::config::PipelineConfig;
use crate::types::job::{JobStage, SourcingJob};

/// Score saved candidates until none remain unscored.
///
/// Each pass pulls up to `score_batch_size` not-yet-scored rows and scores
/// them with bounded concurrency; one candidate's failure never stops its
/// siblings, and a failed item simply stays unscored for the next pass.
/// Resume safety comes from the status flag alone; there is no separate
/// checkpoint structure to maintain.
///
/// A pass that scores none of its pulled batch stops the stage with a
/// retryable error instead of spinning against a dead provider; the rows
/// stay unscored and the next run retries them.
pub async fn run_score<S: SourcingStore>(
    job: &mut SourcingJob,
    store: &S,
    scorer: &dyn CandidateScorer,
    config: &PipelineConfig,
) -> Result<()> {
    let requirements = job
        .requirements
        .clone()
        .ok_or_else(|| SourcingError::InvalidJob {
            reason: "cannot score without derived requirements".into(),
        })?;
    let description = job.description.clone();

    loop {
        let batch = store.find_unscored(job.id, config.score_batch_size).await?;
        if batch.is_empty() {
            break;
        }

        let tasks = batch
            .iter()
            .map(|candidate| scorer.score(candidate, &description, &requirements));
        let results = settle_all(tasks, config.ai_concurrency).await;

        let mut scored_this_pass = 0usize;
        for (candidate, result) in batch.iter().zip(results) {
            match result {
                Ok(response) => {
                    let score = CandidateScore::from_response(response);
                    match store.apply_score(candidate.id, &score).await {
                        Ok(()) => scored_this_pass += 1,
                        Err(e) => {
                            warn!(
                                job_id = %job.id,
                                candidate_id = %candidate.id,
                                error = %e,
                                "failed to persist score"
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        job_id = %job.id,
                        candidate_id = %candidate.id,
                        url = %candidate.profile_url,
                        error = %e,
                        "scoring failed, candidate stays unscored"
                    );
                }
            }
        }

        job.progress.scored += scored_this_pass;
        job.touch();
        store.update_job(job).await?;

        if scored_this_pass == 0 {
            job.record_error(
                JobStage::Score,
                "scoring pass made no progress, stopping for retry",
                true,
            );
            store.update_job(job).await?;
            return Err(SourcingError::provider(
                "scoring",
                "no candidates could be scored in a full pass",
            ));
        }
    }

    info!(job_id = %job.id, scored = job.progress.scored, "scoring complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::MockScorer;
    use crate::traits::ai::ScoreResponse;
    use crate::traits::store::{CandidateStore, JobStore};
    use crate::types::candidate::{Candidate, CandidateStatus, ContactInfo};
    use crate::types::requirements::JobRequirements;
    use uuid::Uuid;

    async fn seed_saved(store: &MemoryStore, job: &SourcingJob, url: &str) -> Uuid {
        let mut candidate = Candidate::enriched(
            job.id,
            job.owner_id,
            url,
            ContactInfo {
                email: "c@x.com".into(),
                phone: None,
                source: None,
            },
        );
        candidate.status = CandidateStatus::Saved;
        candidate.full_name = Some("Jane Doe".into());
        store.insert_candidate(&candidate).await.unwrap();
        candidate.id
    }

    fn scoring_job() -> SourcingJob {
        SourcingJob::new(Uuid::new_v4(), "desc", 10)
            .with_requirements(JobRequirements::default())
    }

    #[tokio::test]
    async fn all_saved_candidates_get_scored() {
        let store = MemoryStore::new();
        let scorer = MockScorer::new().with_default(ScoreResponse {
            skills_match: 20,
            experience_fit: 18,
            industry_relevance: 10,
            title_fit: 12,
            bonus: 5,
            ..Default::default()
        });

        let mut job = scoring_job();
        store.create_job(&job).await.unwrap();
        for url in ["https://x/a", "https://x/b", "https://x/c"] {
            seed_saved(&store, &job, url).await;
        }

        run_score(&mut job, &store, &scorer, &PipelineConfig::default())
            .await
            .unwrap();

        assert_eq!(job.progress.scored, 3);
        assert!(store.find_unscored(job.id, 10).await.unwrap().is_empty());
        let row = store
            .get_candidate_by_url(job.id, "https://x/a")
            .await
            .unwrap()
            .unwrap();
        let score = row.score.unwrap();
        assert_eq!(score.total, 65);
        assert_eq!(row.status, CandidateStatus::Scored);
    }

    #[tokio::test]
    async fn one_failure_leaves_the_item_unscored_for_the_next_pass() {
        let store = MemoryStore::new();
        let scorer = MockScorer::new()
            .with_default(ScoreResponse::default())
            .failing_on("https://x/flaky");

        let mut job = scoring_job();
        store.create_job(&job).await.unwrap();
        seed_saved(&store, &job, "https://x/ok").await;
        seed_saved(&store, &job, "https://x/flaky").await;

        // The flaky candidate keeps failing; the pass that contains only it
        // makes no progress and the stage stops with a retryable error.
        let err = run_score(&mut job, &store, &scorer, &PipelineConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(job.progress.scored, 1);

        let unscored = store.find_unscored(job.id, 10).await.unwrap();
        assert_eq!(unscored.len(), 1);
        assert_eq!(unscored[0].profile_url, "https://x/flaky");

        // Provider recovers; the retried stage scores the remainder.
        scorer.clear_failures();
        run_score(&mut job, &store, &scorer, &PipelineConfig::default())
            .await
            .unwrap();
        assert_eq!(job.progress.scored, 2);
        assert!(store.find_unscored(job.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scoring_with_no_saved_rows_is_a_clean_noop() {
        let store = MemoryStore::new();
        let scorer = MockScorer::new();

        let mut job = scoring_job();
        store.create_job(&job).await.unwrap();

        run_score(&mut job, &store, &scorer, &PipelineConfig::default())
            .await
            .unwrap();
        assert_eq!(job.progress.scored, 0);
    }
}
