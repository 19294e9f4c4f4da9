//! Enrich-and-create stage: the contact gate.
//!
//! One call at a time with a mandatory fixed delay: the provider enforces
//! a hard per-minute quota, so no concurrency is used here by design.

use governor::{Quota, RateLimiter};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::traits::enricher::{ContactEnricher, EmailType, EnrichmentResponse};
use crate::traits::store::SourcingStore;
use crate::types::candidate::{Candidate, ContactInfo};
use crate::types::config::PipelineConfig;
use crate::types::job::SourcingJob;

/// Pick at most one email and one phone from an enrichment response.
///
/// Email priority: verified personal, then verified work, then any work,
/// then the first available. Phone: work-typed preferred, else the first.
/// Returns `None` when no email exists; a phone alone does not pass the
/// contact gate.
pub fn select_contact(response: &EnrichmentResponse) -> Option<ContactInfo> {
    let email = response
        .emails
        .iter()
        .find(|e| e.verified && e.email_type == Some(EmailType::Personal))
        .or_else(|| {
            response
                .emails
                .iter()
                .find(|e| e.verified && e.email_type == Some(EmailType::Work))
        })
        .or_else(|| {
            response
                .emails
                .iter()
                .find(|e| e.email_type == Some(EmailType::Work))
        })
        .or_else(|| response.emails.first())?;

    let phone = response
        .phones
        .iter()
        .find(|p| {
            p.phone_type
                .as_deref()
                .map(|t| t.to_lowercase().contains("work"))
                .unwrap_or(false)
        })
        .or_else(|| response.phones.first());

    Some(ContactInfo {
        email: email.address.clone(),
        phone: phone.map(|p| p.number.clone()),
        source: None,
    })
}

/// Enrich every discovered profile URL that does not yet have a Candidate
/// row, creating rows for the contactable ones.
///
/// Rows are created immediately per profile, not at the end of the batch,
/// so a crash mid-stage loses no value. Profiles without a contact method
/// are discarded with no row created, because downstream stages must not
/// spend scrape/parse/score budget on unreachable candidates. On resume, URLs
/// with existing rows count toward the contactable total without an
/// adapter call.
///
/// A failed enrichment call for one URL is an expected item-level outcome
/// (the URL is simply discarded); it does not set the job's error field.
pub async fn run_enrich<S: SourcingStore>(
    job: &mut SourcingJob,
    store: &S,
    enricher: &dyn ContactEnricher,
    config: &PipelineConfig,
) -> Result<()> {
    let limiter = RateLimiter::direct(
        Quota::with_period(config.enrich_interval).expect("enrich interval must be non-zero"),
    );

    let mut contactable = store.count_contactable(job.id).await?;
    let urls: Vec<String> = job.profile_urls.iter().cloned().collect();

    for url in &urls {
        if store.candidate_exists(job.id, url).await? {
            continue;
        }

        limiter.until_ready().await;

        let response = match enricher.enrich(url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(job_id = %job.id, url = %url, error = %e, "enrichment call failed, discarding profile");
                continue;
            }
        };

        match select_contact(&response) {
            Some(mut contact) => {
                contact.source = Some(enricher.name().to_string());
                let candidate = Candidate::enriched(job.id, job.owner_id, url, contact);
                store.insert_candidate(&candidate).await?;
                contactable += 1;
            }
            None => {
                debug!(job_id = %job.id, url = %url, "no contact method found, discarding profile");
            }
        }
    }

    info!(
        job_id = %job.id,
        contactable,
        target = job.max_candidates,
        "enrichment pass complete"
    );

    job.candidates_with_contact = contactable;
    job.touch();
    store.update_job(job).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::MockEnricher;
    use crate::traits::enricher::{EmailRecord, PhoneRecord};
    use crate::traits::store::{CandidateStore, JobStore};
    use std::time::Duration;
    use uuid::Uuid;

    fn fast_config() -> PipelineConfig {
        PipelineConfig::default().with_enrich_interval(Duration::from_millis(1))
    }

    fn job_with_urls(urls: &[&str]) -> SourcingJob {
        let mut job = SourcingJob::new(Uuid::new_v4(), "desc", 10);
        for url in urls {
            job.profile_urls.insert(url.to_string());
        }
        job
    }

    #[test]
    fn email_policy_prefers_verified_personal() {
        let response = EnrichmentResponse {
            emails: vec![
                EmailRecord::work("work@corp.com", true),
                EmailRecord::personal("jane@gmail.com", true),
            ],
            phones: vec![],
        };
        let contact = select_contact(&response).unwrap();
        assert_eq!(contact.email, "jane@gmail.com");
    }

    #[test]
    fn email_policy_falls_back_in_order() {
        // Verified work beats unverified work
        let response = EnrichmentResponse {
            emails: vec![
                EmailRecord::work("a@corp.com", false),
                EmailRecord::work("b@corp.com", true),
            ],
            phones: vec![],
        };
        assert_eq!(select_contact(&response).unwrap().email, "b@corp.com");

        // Any work beats an untyped first entry
        let response = EnrichmentResponse {
            emails: vec![
                EmailRecord::new("mystery@somewhere.com"),
                EmailRecord::work("c@corp.com", false),
            ],
            phones: vec![],
        };
        assert_eq!(select_contact(&response).unwrap().email, "c@corp.com");

        // Otherwise the first available
        let response = EnrichmentResponse {
            emails: vec![EmailRecord::new("only@somewhere.com")],
            phones: vec![],
        };
        assert_eq!(select_contact(&response).unwrap().email, "only@somewhere.com");
    }

    #[test]
    fn phone_prefers_work_typed_number() {
        let response = EnrichmentResponse {
            emails: vec![EmailRecord::new("a@x.com")],
            phones: vec![
                PhoneRecord {
                    number: "111".into(),
                    phone_type: Some("mobile".into()),
                },
                PhoneRecord {
                    number: "222".into(),
                    phone_type: Some("work_hq".into()),
                },
            ],
        };
        assert_eq!(select_contact(&response).unwrap().phone.as_deref(), Some("222"));
    }

    #[test]
    fn phone_alone_does_not_pass_the_gate() {
        let response = EnrichmentResponse {
            emails: vec![],
            phones: vec![PhoneRecord {
                number: "111".into(),
                phone_type: None,
            }],
        };
        assert!(select_contact(&response).is_none());
    }

    #[tokio::test]
    async fn contactable_profiles_get_rows_others_are_discarded() {
        let store = MemoryStore::new();
        let enricher = MockEnricher::new()
            .with_email("https://x/a", "a@x.com")
            .with_empty("https://x/b");

        let mut job = job_with_urls(&["https://x/a", "https://x/b"]);
        store.create_job(&job).await.unwrap();

        run_enrich(&mut job, &store, &enricher, &fast_config())
            .await
            .unwrap();

        assert!(store.candidate_exists(job.id, "https://x/a").await.unwrap());
        assert!(!store.candidate_exists(job.id, "https://x/b").await.unwrap());
        assert_eq!(job.candidates_with_contact, 1);
    }

    #[tokio::test]
    async fn provider_failure_is_item_level_and_sets_no_job_error() {
        let store = MemoryStore::new();
        let enricher = MockEnricher::new()
            .with_email("https://x/a", "a@x.com")
            .failing_on("https://x/b");

        let mut job = job_with_urls(&["https://x/a", "https://x/b"]);
        store.create_job(&job).await.unwrap();

        run_enrich(&mut job, &store, &enricher, &fast_config())
            .await
            .unwrap();

        assert!(!store.candidate_exists(job.id, "https://x/b").await.unwrap());
        assert_eq!(job.error_message, None);
        assert!(job.error_log.is_empty());
    }

    #[tokio::test]
    async fn existing_rows_are_counted_without_new_calls() {
        let store = MemoryStore::new();
        let enricher = MockEnricher::new().with_email("https://x/b", "b@x.com");

        let mut job = job_with_urls(&["https://x/a", "https://x/b"]);
        store.create_job(&job).await.unwrap();

        // Row from an earlier run of this job
        let existing = Candidate::enriched(
            job.id,
            job.owner_id,
            "https://x/a",
            ContactInfo {
                email: "a@x.com".into(),
                phone: None,
                source: None,
            },
        );
        store.insert_candidate(&existing).await.unwrap();

        run_enrich(&mut job, &store, &enricher, &fast_config())
            .await
            .unwrap();

        assert_eq!(enricher.calls(), vec!["https://x/b".to_string()]);
        assert_eq!(job.candidates_with_contact, 2);
    }
}
