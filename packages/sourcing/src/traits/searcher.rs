//! Profile-search provider contract.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::requirements::QueryVariant;

/// One profile surfaced by a search call.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub profile_url: String,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
}

impl SearchHit {
    pub fn new(profile_url: impl Into<String>) -> Self {
        Self {
            profile_url: profile_url.into(),
            full_name: None,
            headline: None,
            location: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.full_name = Some(name.into());
        self
    }

    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = Some(headline.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Search provider for discovering candidate profiles.
///
/// Results must not be assumed exhaustive or stable across calls; the
/// search stage set-unions URLs precisely because repeat calls overlap.
#[async_trait]
pub trait ProfileSearcher: Send + Sync {
    /// Execute one query variant, returning up to `limit` hits.
    ///
    /// Zero results is a legal outcome, not an error.
    async fn search(&self, variant: &QueryVariant, limit: usize) -> Result<Vec<SearchHit>>;
}
