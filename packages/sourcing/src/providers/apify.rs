//! Apify-backed profile scraper.
//!
//! Runs a scraping actor per batch: start the run, long-poll until it
//! finishes (`waitForFinish` keeps the connection open server-side), then
//! fetch the dataset items.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Result, SourcingError};
use crate::security::SecretString;
use crate::traits::scraper::ProfileScraper;
use crate::types::profile::ScrapedProfile;

const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

/// Wrapper for Apify API responses.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

/// Apify actor run metadata.
#[derive(Debug, Deserialize)]
struct RunData {
    id: String,
    status: String,
    #[serde(rename = "defaultDatasetId")]
    default_dataset_id: String,
}

/// Profile scraper backed by an Apify actor.
pub struct ApifyScraper {
    client: reqwest::Client,
    token: SecretString,
    actor_id: String,
    base_url: String,
}

impl ApifyScraper {
    pub fn new(token: impl Into<String>, actor_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: SecretString::new(token),
            actor_id: actor_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from `APIFY_TOKEN` and `APIFY_SCRAPER_ACTOR` environment
    /// variables.
    pub fn from_env() -> Result<Self> {
        let token = SecretString::from_env("APIFY_TOKEN")?;
        let actor_id = std::env::var("APIFY_SCRAPER_ACTOR")
            .map_err(|_| SourcingError::Config("APIFY_SCRAPER_ACTOR not set".into()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            token,
            actor_id,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Set a custom base URL (for proxies and tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Start a scrape run for a batch of profile URLs.
    async fn start_run(&self, urls: &[String]) -> Result<RunData> {
        let input = json!({ "profileUrls": urls });
        let response = self
            .client
            .post(format!("{}/acts/{}/runs", self.base_url, self.actor_id))
            .bearer_auth(self.token.expose())
            .json(&input)
            .send()
            .await
            .map_err(|e| SourcingError::provider("scrape", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourcingError::provider(
                "scrape",
                format!("Apify API error: {status}"),
            ));
        }

        let body: ApiResponse<RunData> = response
            .json()
            .await
            .map_err(|e| SourcingError::provider("scrape", e))?;
        Ok(body.data)
    }

    /// Poll until a run completes. Uses `waitForFinish=60` for efficient
    /// long-polling.
    async fn wait_for_run(&self, run_id: &str) -> Result<RunData> {
        loop {
            let response = self
                .client
                .get(format!(
                    "{}/actor-runs/{}?waitForFinish=60",
                    self.base_url, run_id
                ))
                .bearer_auth(self.token.expose())
                .send()
                .await
                .map_err(|e| SourcingError::provider("scrape", e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(SourcingError::provider(
                    "scrape",
                    format!("Apify API error: {status}"),
                ));
            }

            let body: ApiResponse<RunData> = response
                .json()
                .await
                .map_err(|e| SourcingError::provider("scrape", e))?;

            match body.data.status.as_str() {
                "SUCCEEDED" => return Ok(body.data),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(SourcingError::provider(
                        "scrape",
                        format!("Apify run ended with status {}", body.data.status),
                    ));
                }
                _ => {
                    debug!(run_id, status = %body.data.status, "run still in progress");
                    continue;
                }
            }
        }
    }

    /// Fetch dataset items from a completed run.
    async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(format!("{}/datasets/{}/items", self.base_url, dataset_id))
            .bearer_auth(self.token.expose())
            .send()
            .await
            .map_err(|e| SourcingError::provider("scrape", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourcingError::provider(
                "scrape",
                format!("Apify API error: {status}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| SourcingError::provider("scrape", e))
    }
}

/// URL an item claims to describe, across the field names actors use.
fn item_url(item: &Value) -> Option<&str> {
    ["url", "profileUrl", "linkedinUrl", "inputUrl"]
        .iter()
        .find_map(|key| item.get(*key))
        .and_then(Value::as_str)
}

fn normalize(url: &str) -> &str {
    url.trim_end_matches('/')
}

#[async_trait]
impl ProfileScraper for ApifyScraper {
    async fn scrape_batch(&self, urls: &[String]) -> Result<Vec<ScrapedProfile>> {
        let run = self.start_run(urls).await?;
        let finished = self.wait_for_run(&run.id).await?;
        let items = self.dataset_items(&finished.default_dataset_id).await?;

        // Match items back to the requested URLs; anything the actor
        // returned nothing for is a per-URL failure, not a batch failure.
        Ok(urls
            .iter()
            .map(|url| {
                let matched = items
                    .iter()
                    .find(|item| item_url(item).map(normalize) == Some(normalize(url)));
                match matched {
                    Some(item) => ScrapedProfile::success(url, item.clone()),
                    None => ScrapedProfile::failure(url, "no data returned for profile"),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_urls_resolve_across_field_aliases() {
        let by_url = json!({"url": "https://x/p"});
        let by_profile_url = json!({"profileUrl": "https://x/q"});
        assert_eq!(item_url(&by_url), Some("https://x/p"));
        assert_eq!(item_url(&by_profile_url), Some("https://x/q"));
        assert_eq!(item_url(&json!({"other": 1})), None);
    }

    #[test]
    fn trailing_slashes_do_not_break_matching() {
        assert_eq!(normalize("https://x/p/"), normalize("https://x/p"));
    }
}
