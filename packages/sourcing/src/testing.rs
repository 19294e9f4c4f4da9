//! Testing utilities including mock implementations.
//!
//! These are useful for exercising the pipeline end-to-end without real
//! provider or model calls. Every mock records the calls made to it so
//! tests can assert on resume behavior (which calls were skipped) as well
//! as outcomes.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::{Result, SourcingError};
use crate::traits::ai::{
    CandidateScorer, ProfileExtractor, RequirementsFormatter, ScoreResponse,
};
use crate::traits::enricher::{ContactEnricher, EmailRecord, EnrichmentResponse};
use crate::traits::scraper::ProfileScraper;
use crate::traits::searcher::{ProfileSearcher, SearchHit};
use crate::types::candidate::Candidate;
use crate::types::profile::ScrapedProfile;
use crate::types::requirements::{JobRequirements, QueryVariant, VariantKind};

/// Mock requirements formatter returning a canned result.
#[derive(Default)]
pub struct MockFormatter {
    requirements: JobRequirements,
    fail_fatally: bool,
}

impl MockFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requirements(mut self, requirements: JobRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    /// Simulate missing credentials: a fatal configuration error.
    pub fn failing_fatally(mut self) -> Self {
        self.fail_fatally = true;
        self
    }
}

#[async_trait]
impl RequirementsFormatter for MockFormatter {
    async fn format_requirements(&self, _description: &str) -> Result<JobRequirements> {
        if self.fail_fatally {
            return Err(SourcingError::Config("formatter API key not set".into()));
        }
        Ok(self.requirements.clone())
    }
}

/// Mock search provider with per-variant results and failures.
#[derive(Default)]
pub struct MockSearcher {
    results: Arc<RwLock<HashMap<VariantKind, Vec<SearchHit>>>>,
    failures: Arc<RwLock<HashSet<VariantKind>>>,
    calls: Arc<RwLock<Vec<VariantKind>>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(self, kind: VariantKind, hits: Vec<SearchHit>) -> Self {
        self.results.write().unwrap().insert(kind, hits);
        self
    }

    /// Add bare URLs as hits for a variant.
    pub fn with_urls(self, kind: VariantKind, urls: &[&str]) -> Self {
        let hits = urls.iter().map(|u| SearchHit::new(*u)).collect();
        self.with_hits(kind, hits)
    }

    pub fn failing_on(self, kind: VariantKind) -> Self {
        self.failures.write().unwrap().insert(kind);
        self
    }

    /// Variants searched, in call order.
    pub fn calls(&self) -> Vec<VariantKind> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ProfileSearcher for MockSearcher {
    async fn search(&self, variant: &QueryVariant, limit: usize) -> Result<Vec<SearchHit>> {
        self.calls.write().unwrap().push(variant.kind);
        if self.failures.read().unwrap().contains(&variant.kind) {
            return Err(SourcingError::provider("search", "mock search outage"));
        }
        let mut hits = self
            .results
            .read()
            .unwrap()
            .get(&variant.kind)
            .cloned()
            .unwrap_or_default();
        hits.truncate(limit);
        Ok(hits)
    }
}

/// Mock contact-enrichment provider.
#[derive(Default)]
pub struct MockEnricher {
    responses: Arc<RwLock<HashMap<String, EnrichmentResponse>>>,
    failures: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a verified personal email for a URL.
    pub fn with_email(self, url: &str, address: &str) -> Self {
        let response = EnrichmentResponse {
            emails: vec![EmailRecord::personal(address, true)],
            phones: vec![],
        };
        self.with_response(url, response)
    }

    pub fn with_response(self, url: &str, response: EnrichmentResponse) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    /// Report no contact methods for a URL.
    pub fn with_empty(self, url: &str) -> Self {
        self.with_response(url, EnrichmentResponse::empty())
    }

    /// Simulate a hard provider failure (e.g. HTTP 500) for a URL.
    pub fn failing_on(self, url: &str) -> Self {
        self.failures.write().unwrap().insert(url.to_string());
        self
    }

    /// URLs enriched, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ContactEnricher for MockEnricher {
    async fn enrich(&self, profile_url: &str) -> Result<EnrichmentResponse> {
        self.calls.write().unwrap().push(profile_url.to_string());
        if self.failures.read().unwrap().contains(profile_url) {
            return Err(SourcingError::provider("enrichment", "mock enrichment outage"));
        }
        Ok(self
            .responses
            .read()
            .unwrap()
            .get(profile_url)
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Mock batch scraper with batch-level failure injection.
#[derive(Default)]
pub struct MockScraper {
    payloads: Arc<RwLock<HashMap<String, Value>>>,
    fail_batch_with: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<Vec<String>>>>,
}

impl MockScraper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide simple named payloads for a list of URLs.
    pub fn with_profiles(self, urls: &[&str]) -> Self {
        {
            let mut payloads = self.payloads.write().unwrap();
            for url in urls {
                let slug = url.rsplit('/').next().unwrap_or("unknown");
                payloads.insert(
                    url.to_string(),
                    json!({
                        "name": format!("Candidate {slug}"),
                        "url": url,
                        "title": "Engineer",
                        "skills": ["Rust"],
                    }),
                );
            }
        }
        self
    }

    pub fn with_payload(self, url: &str, payload: Value) -> Self {
        self.payloads
            .write()
            .unwrap()
            .insert(url.to_string(), payload);
        self
    }

    /// Fail any batch that contains this URL, wholesale.
    pub fn failing_on_batch_with(self, url: &str) -> Self {
        self.fail_batch_with
            .write()
            .unwrap()
            .insert(url.to_string());
        self
    }

    pub fn clear_failures(&self) {
        self.fail_batch_with.write().unwrap().clear();
    }

    /// Batches submitted, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.read().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl ProfileScraper for MockScraper {
    async fn scrape_batch(&self, urls: &[String]) -> Result<Vec<ScrapedProfile>> {
        self.calls.write().unwrap().push(urls.to_vec());

        let failing = self.fail_batch_with.read().unwrap();
        if urls.iter().any(|u| failing.contains(u)) {
            return Err(SourcingError::provider("scrape", "mock scrape outage"));
        }

        let payloads = self.payloads.read().unwrap();
        Ok(urls
            .iter()
            .map(|url| match payloads.get(url) {
                Some(payload) => ScrapedProfile::success(url, payload.clone()),
                None => ScrapedProfile::failure(url, "no data returned"),
            })
            .collect())
    }
}

/// Mock extraction model.
///
/// By default it echoes the cleaned input back, which parses whenever the
/// payload already carries the mandatory fields; overrides let tests
/// return arbitrary shapes (arrays, junk) per profile URL.
#[derive(Default)]
pub struct MockExtractor {
    outputs: Arc<RwLock<HashMap<String, Value>>>,
    failures: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<Value>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a fixed output for profiles whose payload URL matches.
    pub fn with_output(self, url: &str, output: Value) -> Self {
        self.outputs.write().unwrap().insert(url.to_string(), output);
        self
    }

    pub fn failing_on(self, url: &str) -> Self {
        self.failures.write().unwrap().insert(url.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    fn payload_url(profile: &Value) -> Option<String> {
        ["url", "profileUrl", "profile_url"]
            .iter()
            .find_map(|key| profile.get(*key))
            .and_then(Value::as_str)
            .map(String::from)
    }
}

#[async_trait]
impl ProfileExtractor for MockExtractor {
    async fn extract(&self, profile: &Value) -> Result<Value> {
        self.calls.write().unwrap().push(profile.clone());

        if let Some(url) = Self::payload_url(profile) {
            if self.failures.read().unwrap().contains(&url) {
                return Err(SourcingError::provider("extraction", "mock model outage"));
            }
            if let Some(output) = self.outputs.read().unwrap().get(&url) {
                return Ok(output.clone());
            }
        }

        Ok(profile.clone())
    }
}

/// Mock scoring model with a default response and per-URL overrides.
#[derive(Default)]
pub struct MockScorer {
    default: ScoreResponse,
    overrides: Arc<RwLock<HashMap<String, ScoreResponse>>>,
    failures: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, response: ScoreResponse) -> Self {
        self.default = response;
        self
    }

    pub fn with_score(self, url: &str, response: ScoreResponse) -> Self {
        self.overrides
            .write()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    pub fn failing_on(self, url: &str) -> Self {
        self.failures.write().unwrap().insert(url.to_string());
        self
    }

    pub fn clear_failures(&self) {
        self.failures.write().unwrap().clear();
    }

    /// Profile URLs scored, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl CandidateScorer for MockScorer {
    async fn score(
        &self,
        candidate: &Candidate,
        _description: &str,
        _requirements: &JobRequirements,
    ) -> Result<ScoreResponse> {
        self.calls
            .write()
            .unwrap()
            .push(candidate.profile_url.clone());

        if self
            .failures
            .read()
            .unwrap()
            .contains(&candidate.profile_url)
        {
            return Err(SourcingError::provider("scoring", "mock model outage"));
        }

        Ok(self
            .overrides
            .read()
            .unwrap()
            .get(&candidate.profile_url)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}
