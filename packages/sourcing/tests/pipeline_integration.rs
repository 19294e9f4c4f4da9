//! End-to-end pipeline tests over the in-memory store and mock providers.

use std::time::Duration;

use tokio_test::assert_ok;

use sourcing::testing::{
    MockEnricher, MockExtractor, MockFormatter, MockScorer, MockScraper, MockSearcher,
};
use sourcing::{
    run_job, submit_job, Adapters, CandidateQuery, CandidateStore, JobRequirements, JobStage,
    JobStatus, JobStore, MemoryStore, PipelineConfig, ScoreResponse, SearchHit, SourcingError,
    VariantKind, NO_CANDIDATES_MESSAGE,
};
use uuid::Uuid;

fn requirements() -> JobRequirements {
    JobRequirements {
        titles: vec!["Staff Engineer".into(), "Senior Engineer".into()],
        required_skills: vec!["Rust".into(), "Postgres".into()],
        nice_to_have_skills: vec!["Kafka".into()],
        location: Some("Berlin".into()),
        industry: Some("Fintech".into()),
        min_years: Some(5.0),
        seniority: None,
    }
}

fn config() -> PipelineConfig {
    PipelineConfig::default().with_enrich_interval(Duration::from_millis(1))
}

fn default_score() -> ScoreResponse {
    ScoreResponse {
        skills_match: 20,
        experience_fit: 18,
        industry_relevance: 12,
        title_fit: 10,
        bonus: 4,
        matched_skills: vec!["Rust".into()],
        missing_skills: vec!["Postgres".into()],
        bonus_skills: vec![],
        relevant_years: 6.0,
        seniority: Some("senior".into()),
        industry_match: Some("match".into()),
        reasoning: "solid fit".into(),
    }
}

fn urls(count: usize, offset: usize) -> Vec<String> {
    (offset..offset + count)
        .map(|i| format!("https://li.example/in/p{i}"))
        .collect()
}

fn hits(urls: &[String]) -> Vec<SearchHit> {
    urls.iter().map(|u| SearchHit::new(u.clone())).collect()
}

#[tokio::test]
async fn full_run_completes_with_scored_candidates() {
    let store = MemoryStore::new();
    let found = urls(5, 0);
    let found_refs: Vec<&str> = found.iter().map(String::as_str).collect();

    let formatter = MockFormatter::new().with_requirements(requirements());
    let searcher = MockSearcher::new().with_hits(VariantKind::Precise, hits(&found));
    let mut enricher = MockEnricher::new();
    for (i, url) in found.iter().enumerate() {
        enricher = enricher.with_email(url, &format!("p{i}@example.com"));
    }
    let scraper = MockScraper::new().with_profiles(&found_refs);
    let extractor = MockExtractor::new();
    let scorer = MockScorer::new().with_default(default_score());

    let adapters = Adapters {
        formatter: &formatter,
        searcher: &searcher,
        enricher: &enricher,
        scraper: &scraper,
        extractor: &extractor,
        scorer: &scorer,
    };

    let job_id = submit_job(&store, Uuid::new_v4(), "Senior Rust engineer, Berlin", 5)
        .await
        .unwrap();
    let status = run_job(job_id, &store, &adapters, &config()).await.unwrap();
    assert_eq!(status, JobStatus::Completed);

    let job = store.get_job(job_id).await.unwrap().unwrap();
    assert_eq!(job.stage, JobStage::Completed);
    assert_eq!(job.error_message, None);
    assert!(job.completed_at.is_some());

    // Monotonic progress after the final checkpoint.
    assert!(job.progress.scored <= job.progress.saved);
    assert!(job.progress.saved <= job.progress.parsed);
    assert!(job.progress.parsed <= job.progress.scraped);
    assert!(job.progress.scraped <= job.progress.found);
    assert_eq!(job.progress.scored, 5);

    let candidates = store
        .get_candidates(job_id, &CandidateQuery::default())
        .await
        .unwrap();
    assert_eq!(candidates.len(), 5);
    for candidate in &candidates {
        assert!(candidate.has_contact_info);
        assert!(candidate.is_scored);
        let score = candidate.score.as_ref().unwrap();
        assert_eq!(score.total, 64);
        assert!(score.skills_match <= 25);
        assert!(score.bonus <= 10);
        assert!(candidate.full_name.is_some());
    }
}

#[tokio::test]
async fn short_enrichment_loops_to_broad_search_before_scraping() {
    // maxCandidates = 50: precise search returns 80 URLs but enrichment
    // finds only 45 emails, so the orchestrator loops to the broad
    // variant before proceeding to scrape.
    let store = MemoryStore::new();
    let precise_urls = urls(80, 0);
    let broad_urls = urls(10, 80);
    let all: Vec<String> = precise_urls.iter().chain(broad_urls.iter()).cloned().collect();
    let all_refs: Vec<&str> = all.iter().map(String::as_str).collect();

    let formatter = MockFormatter::new().with_requirements(requirements());
    let searcher = MockSearcher::new()
        .with_hits(VariantKind::Precise, hits(&precise_urls))
        .with_hits(VariantKind::Broad, hits(&broad_urls));

    // 45 of the precise URLs and all 10 broad URLs have emails.
    let mut enricher = MockEnricher::new();
    for (i, url) in precise_urls.iter().enumerate() {
        if i < 45 {
            enricher = enricher.with_email(url, &format!("p{i}@example.com"));
        } else {
            enricher = enricher.with_empty(url);
        }
    }
    for (i, url) in broad_urls.iter().enumerate() {
        enricher = enricher.with_email(url, &format!("b{i}@example.com"));
    }

    let scraper = MockScraper::new().with_profiles(&all_refs);
    let extractor = MockExtractor::new();
    let scorer = MockScorer::new().with_default(default_score());

    let adapters = Adapters {
        formatter: &formatter,
        searcher: &searcher,
        enricher: &enricher,
        scraper: &scraper,
        extractor: &extractor,
        scorer: &scorer,
    };

    let job_id = submit_job(&store, Uuid::new_v4(), "Senior Rust engineer", 50)
        .await
        .unwrap();
    let status = run_job(job_id, &store, &adapters, &config()).await.unwrap();
    assert_eq!(status, JobStatus::Completed);

    // Fallback cascade order: precise first, then broad, nothing further.
    assert_eq!(
        searcher.calls(),
        vec![VariantKind::Precise, VariantKind::Broad]
    );

    let job = store.get_job(job_id).await.unwrap().unwrap();
    assert_eq!(job.progress.found, 90);
    assert_eq!(job.candidates_with_contact, 55);
    assert_eq!(job.progress.scored, 55);
    assert!(job.search_iterations == 2);
}

#[tokio::test]
async fn exhausted_variants_resolve_to_the_no_candidates_marker() {
    let store = MemoryStore::new();

    // No nice-to-have skills: the ladder is precise → broad → loose.
    let mut reqs = requirements();
    reqs.nice_to_have_skills.clear();

    let formatter = MockFormatter::new().with_requirements(reqs);
    let searcher = MockSearcher::new(); // zero results for every variant
    let enricher = MockEnricher::new();
    let scraper = MockScraper::new();
    let extractor = MockExtractor::new();
    let scorer = MockScorer::new();

    let adapters = Adapters {
        formatter: &formatter,
        searcher: &searcher,
        enricher: &enricher,
        scraper: &scraper,
        extractor: &extractor,
        scorer: &scorer,
    };

    let job_id = submit_job(&store, Uuid::new_v4(), "Unicorn wrangler", 10)
        .await
        .unwrap();
    let status = run_job(job_id, &store, &adapters, &config()).await.unwrap();

    // A terminal business outcome, not a system error.
    assert_eq!(status, JobStatus::Failed);
    let job = store.get_job(job_id).await.unwrap().unwrap();
    assert_eq!(job.stage, JobStage::NoCandidates);
    assert_eq!(job.error_message.as_deref(), Some(NO_CANDIDATES_MESSAGE));

    // All three variants were tried, in ladder order.
    assert_eq!(
        searcher.calls(),
        vec![VariantKind::Precise, VariantKind::Broad, VariantKind::Loose]
    );
}

#[tokio::test]
async fn contact_gate_holds_for_every_discovered_url() {
    // One enrichment call in twenty fails hard (HTTP 500 style). That URL
    // is discarded, the other nineteen proceed, and the job error field
    // stays clear because this is an expected item-level outcome.
    let store = MemoryStore::new();
    let found = urls(20, 0);
    let found_refs: Vec<&str> = found.iter().map(String::as_str).collect();
    let failing_url = found[7].clone();

    let formatter = MockFormatter::new().with_requirements(requirements());
    let searcher = MockSearcher::new().with_hits(VariantKind::Precise, hits(&found));
    let mut enricher = MockEnricher::new().failing_on(&failing_url);
    for (i, url) in found.iter().enumerate() {
        if *url != failing_url {
            enricher = enricher.with_email(url, &format!("p{i}@example.com"));
        }
    }
    let scraper = MockScraper::new().with_profiles(&found_refs);
    let extractor = MockExtractor::new();
    let scorer = MockScorer::new().with_default(default_score());

    let adapters = Adapters {
        formatter: &formatter,
        searcher: &searcher,
        enricher: &enricher,
        scraper: &scraper,
        extractor: &extractor,
        scorer: &scorer,
    };

    let job_id = submit_job(&store, Uuid::new_v4(), "Senior Rust engineer", 19)
        .await
        .unwrap();
    let status = run_job(job_id, &store, &adapters, &config()).await.unwrap();
    assert_eq!(status, JobStatus::Completed);

    // Contact gate: a row exists iff enrichment found an email.
    for url in &found {
        let exists = store.candidate_exists(job_id, url).await.unwrap();
        assert_eq!(exists, *url != failing_url, "gate violated for {url}");
    }

    let job = store.get_job(job_id).await.unwrap().unwrap();
    assert_eq!(job.error_message, None);
    assert_eq!(job.candidates_with_contact, 19);
}

#[tokio::test]
async fn restart_after_scoring_outage_resumes_without_respending_budget() {
    let store = MemoryStore::new();
    let found = urls(3, 0);
    let found_refs: Vec<&str> = found.iter().map(String::as_str).collect();

    let formatter = MockFormatter::new().with_requirements(requirements());
    let searcher = MockSearcher::new().with_hits(VariantKind::Precise, hits(&found));
    let mut enricher = MockEnricher::new();
    for (i, url) in found.iter().enumerate() {
        enricher = enricher.with_email(url, &format!("p{i}@example.com"));
    }
    let scraper = MockScraper::new().with_profiles(&found_refs);
    let extractor = MockExtractor::new();
    let mut scorer = MockScorer::new().with_default(default_score());
    for url in &found {
        scorer = scorer.failing_on(url);
    }

    let adapters = Adapters {
        formatter: &formatter,
        searcher: &searcher,
        enricher: &enricher,
        scraper: &scraper,
        extractor: &extractor,
        scorer: &scorer,
    };

    let job_id = submit_job(&store, Uuid::new_v4(), "Senior Rust engineer", 3)
        .await
        .unwrap();

    // Scoring provider is down: the run stops at SCORE with a retryable
    // error and the job is marked failed but re-runnable.
    let err = run_job(job_id, &store, &adapters, &config())
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    let job = store.get_job(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.stage, JobStage::Score);
    assert!(job.error_message.is_some());

    let search_calls = searcher.calls().len();
    let enrich_calls = enricher.calls().len();
    let scrape_calls = scraper.calls().len();
    let extract_calls = extractor.call_count();
    assert_eq!(enrich_calls, 3);
    assert_eq!(extract_calls, 3);

    // Provider recovers; the re-run finishes the job without repeating
    // any already-checkpointed external work.
    scorer.clear_failures();
    let status = run_job(job_id, &store, &adapters, &config()).await.unwrap();
    assert_eq!(status, JobStatus::Completed);

    assert_eq!(searcher.calls().len(), search_calls);
    assert_eq!(enricher.calls().len(), enrich_calls);
    assert_eq!(scraper.calls().len(), scrape_calls);
    assert_eq!(extractor.call_count(), extract_calls);

    let candidates = store
        .get_candidates(job_id, &CandidateQuery::default())
        .await
        .unwrap();
    assert_eq!(candidates.len(), 3);
    assert!(candidates.iter().all(|c| c.is_scored));

    // Running a completed job again is a no-op.
    let status = run_job(job_id, &store, &adapters, &config()).await.unwrap();
    assert_eq!(status, JobStatus::Completed);
}

#[tokio::test]
async fn scrape_batch_outage_loses_nothing_and_resumes_cleanly() {
    let store = MemoryStore::new();
    let found = urls(4, 0);
    let found_refs: Vec<&str> = found.iter().map(String::as_str).collect();

    let formatter = MockFormatter::new().with_requirements(requirements());
    let searcher = MockSearcher::new().with_hits(VariantKind::Precise, hits(&found));
    let mut enricher = MockEnricher::new();
    for (i, url) in found.iter().enumerate() {
        enricher = enricher.with_email(url, &format!("p{i}@example.com"));
    }
    // The batch containing the third URL fails wholesale.
    let scraper = MockScraper::new()
        .with_profiles(&found_refs)
        .failing_on_batch_with(&found[2]);
    let extractor = MockExtractor::new();
    let scorer = MockScorer::new().with_default(default_score());

    let adapters = Adapters {
        formatter: &formatter,
        searcher: &searcher,
        enricher: &enricher,
        scraper: &scraper,
        extractor: &extractor,
        scorer: &scorer,
    };

    let run_config = config().with_scrape_batch_size(2);
    let job_id = submit_job(&store, Uuid::new_v4(), "Senior Rust engineer", 4)
        .await
        .unwrap();
    let status = run_job(job_id, &store, &adapters, &run_config).await.unwrap();

    // Partial success: the first batch's profiles made it all the way
    // through scoring, the failed batch is recorded on the job.
    assert_eq!(status, JobStatus::Completed);
    let job = store.get_job(job_id).await.unwrap().unwrap();
    assert_eq!(job.progress.scraped, 2);
    assert_eq!(job.progress.scored, 2);
    assert!(job.error_message.as_deref().unwrap().contains("scrape"));
    assert!(job.error_log.iter().any(|e| e.retryable));
}

#[tokio::test]
async fn missing_credentials_fail_the_job_fatally() {
    let store = MemoryStore::new();
    let formatter = MockFormatter::new().failing_fatally();
    let searcher = MockSearcher::new();
    let enricher = MockEnricher::new();
    let scraper = MockScraper::new();
    let extractor = MockExtractor::new();
    let scorer = MockScorer::new();

    let adapters = Adapters {
        formatter: &formatter,
        searcher: &searcher,
        enricher: &enricher,
        scraper: &scraper,
        extractor: &extractor,
        scorer: &scorer,
    };

    let job_id = submit_job(&store, Uuid::new_v4(), "Senior Rust engineer", 10)
        .await
        .unwrap();
    let err = run_job(job_id, &store, &adapters, &config())
        .await
        .unwrap_err();
    assert!(matches!(err, SourcingError::Config(_)));

    let job = store.get_job(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.stage, JobStage::Failed);
    assert!(!job.error_log.is_empty());
    assert!(!job.error_log[0].retryable);
}

#[tokio::test]
async fn array_extractor_output_still_yields_a_saved_candidate() {
    let store = MemoryStore::new();
    let url = "https://li.example/in/janedoe".to_string();

    let formatter = MockFormatter::new().with_requirements(requirements());
    let searcher =
        MockSearcher::new().with_hits(VariantKind::Precise, hits(std::slice::from_ref(&url)));
    let enricher = MockEnricher::new().with_email(&url, "jane@example.com");
    let scraper = MockScraper::new().with_profiles(&[url.as_str()]);
    // The model answers with an array instead of the requested object.
    let extractor = MockExtractor::new().with_output(
        &url,
        serde_json::json!([{
            "fullName": "Jane Doe",
            "profileUrl": url,
        }]),
    );
    let scorer = MockScorer::new().with_default(default_score());

    let adapters = Adapters {
        formatter: &formatter,
        searcher: &searcher,
        enricher: &enricher,
        scraper: &scraper,
        extractor: &extractor,
        scorer: &scorer,
    };

    let job_id = submit_job(&store, Uuid::new_v4(), "Senior Rust engineer", 1)
        .await
        .unwrap();
    let status = tokio_test::assert_ok!(run_job(job_id, &store, &adapters, &config()).await);
    assert_eq!(status, JobStatus::Completed);

    let row = store
        .get_candidate_by_url(job_id, &url)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.full_name.as_deref(), Some("Jane Doe"));
    assert!(row.is_scored);
}
