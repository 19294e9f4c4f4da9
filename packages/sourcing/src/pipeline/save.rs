//! Save stage: persist parsed profiles onto candidate rows.

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::traits::store::SourcingStore;
use crate::types::candidate::CandidateStatus;
use crate::types::config::PipelineConfig;
use crate::types::job::SourcingJob;
use crate::types::profile::ParsedProfile;

/// Persist parsed profiles in batches, skipping rows already saved.
///
/// Each new row gets a cross-job duplicate check (same owner, same profile
/// URL, any earlier job): duplicates are marked with a back-reference to
/// the job where the profile was first seen, but they are still saved and
/// still scored, since "previously sourced" is a signal to the recruiter,
/// not a reason to discard. Items are isolated: one malformed profile cannot
/// abort its batch, and the saved count is checkpointed after every batch.
pub async fn run_save<S: SourcingStore>(
    job: &mut SourcingJob,
    store: &S,
    config: &PipelineConfig,
) -> Result<()> {
    let checkpoint = job.parse_checkpoint.clone().unwrap_or_default();
    let raw_by_url: HashMap<String, Value> = job
        .scrape_checkpoint
        .as_ref()
        .map(|scrape| {
            scrape
                .profiles
                .iter()
                .filter_map(|p| Some((p.url.clone(), p.raw.clone()?)))
                .collect()
        })
        .unwrap_or_default();

    let mut saved = 0usize;

    for batch in checkpoint.profiles.chunks(config.save_batch_size) {
        for profile in batch {
            match save_one(job, profile, raw_by_url.get(&profile.profile_url), store).await {
                Ok(true) => saved += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        job_id = %job.id,
                        url = %profile.profile_url,
                        error = %e,
                        "failed to save profile, skipping"
                    );
                }
            }
        }

        job.progress.saved = saved;
        job.touch();
        store.update_job(job).await?;
    }

    info!(job_id = %job.id, saved, "save complete");
    Ok(())
}

/// Save one parsed profile. Returns whether the row counts as saved.
async fn save_one<S: SourcingStore>(
    job: &SourcingJob,
    profile: &ParsedProfile,
    raw: Option<&Value>,
    store: &S,
) -> Result<bool> {
    let Some(mut candidate) = store
        .get_candidate_by_url(job.id, &profile.profile_url)
        .await?
    else {
        // The contact gate discarded this URL; parsed data has nowhere to go.
        debug!(url = %profile.profile_url, "no contactable row for parsed profile");
        return Ok(false);
    };

    if candidate.status >= CandidateStatus::Saved {
        return Ok(true);
    }

    candidate.apply_parsed(profile);
    if candidate.raw_profile.is_none() {
        candidate.raw_profile = raw.cloned();
    }

    if let Some(first_seen) = store
        .find_first_seen(job.owner_id, &profile.profile_url, job.id)
        .await?
    {
        candidate.is_duplicate = true;
        candidate.first_seen_job_id = Some(first_seen);
    }

    candidate.status = CandidateStatus::Saved;
    candidate.touch();
    store.update_candidate(&candidate).await?;
    Ok(true)
}
