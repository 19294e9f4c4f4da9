//! Apollo-backed search and enrichment adapters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SourcingError};
use crate::security::SecretString;
use crate::traits::enricher::{
    ContactEnricher, EmailRecord, EnrichmentResponse, PhoneRecord,
};
use crate::traits::searcher::{ProfileSearcher, SearchHit};
use crate::types::requirements::QueryVariant;

const DEFAULT_BASE_URL: &str = "https://api.apollo.io/v1";

/// People-search adapter over the Apollo API.
pub struct ApolloSearcher {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl ApolloSearcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: SecretString::new(api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `APOLLO_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: SecretString::from_env("APOLLO_API_KEY")?,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Set a custom base URL (for proxies and tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct PeopleSearchRequest<'a> {
    q_keywords: String,
    person_titles: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    person_locations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    organization_industries: Option<Vec<String>>,
    page: usize,
    per_page: usize,
}

#[derive(Debug, Deserialize)]
struct PeopleSearchResponse {
    #[serde(default)]
    people: Vec<ApolloPerson>,
}

#[derive(Debug, Deserialize)]
struct ApolloPerson {
    linkedin_url: Option<String>,
    name: Option<String>,
    headline: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl ApolloPerson {
    fn location(&self) -> Option<String> {
        let parts: Vec<&str> = [self.city.as_deref(), self.state.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[async_trait]
impl ProfileSearcher for ApolloSearcher {
    async fn search(&self, variant: &QueryVariant, limit: usize) -> Result<Vec<SearchHit>> {
        let request = PeopleSearchRequest {
            q_keywords: variant.keyword_query(),
            person_titles: &variant.titles,
            person_locations: variant.location.clone().map(|l| vec![l]),
            organization_industries: variant.industry.clone().map(|i| vec![i]),
            page: 1,
            per_page: limit,
        };

        let response = self
            .client
            .post(format!("{}/mixed_people/search", self.base_url))
            .header("X-Api-Key", self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| SourcingError::provider("search", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourcingError::provider(
                "search",
                format!("Apollo API error: {status}"),
            ));
        }

        let body: PeopleSearchResponse = response
            .json()
            .await
            .map_err(|e| SourcingError::provider("search", e))?;

        Ok(body
            .people
            .into_iter()
            .filter_map(|person| {
                let mut hit = SearchHit::new(person.linkedin_url.clone()?);
                if let Some(name) = person.name.clone() {
                    hit = hit.with_name(name);
                }
                if let Some(headline) = person.headline.clone() {
                    hit = hit.with_headline(headline);
                }
                if let Some(location) = person.location() {
                    hit = hit.with_location(location);
                }
                Some(hit)
            })
            .collect())
    }
}

/// People-match enrichment adapter over the Apollo API.
pub struct ApolloEnricher {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl ApolloEnricher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: SecretString::new(api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `APOLLO_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: SecretString::from_env("APOLLO_API_KEY")?,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Set a custom base URL (for proxies and tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct PeopleMatchRequest<'a> {
    linkedin_url: &'a str,
    reveal_personal_emails: bool,
    reveal_phone_number: bool,
}

#[derive(Debug, Deserialize)]
struct PeopleMatchResponse {
    person: Option<MatchedPerson>,
}

#[derive(Debug, Deserialize)]
struct MatchedPerson {
    email: Option<String>,
    email_status: Option<String>,
    #[serde(default)]
    personal_emails: Vec<String>,
    #[serde(default)]
    phone_numbers: Vec<ApolloPhone>,
}

#[derive(Debug, Deserialize)]
struct ApolloPhone {
    raw_number: Option<String>,
    #[serde(rename = "type")]
    phone_type: Option<String>,
}

impl From<MatchedPerson> for EnrichmentResponse {
    fn from(person: MatchedPerson) -> Self {
        let mut emails = Vec::new();
        for address in person.personal_emails {
            emails.push(EmailRecord::personal(address, true));
        }
        if let Some(address) = person.email {
            let verified = person.email_status.as_deref() == Some("verified");
            emails.push(EmailRecord::work(address, verified));
        }

        let phones = person
            .phone_numbers
            .into_iter()
            .filter_map(|p| {
                Some(PhoneRecord {
                    number: p.raw_number?,
                    phone_type: p.phone_type,
                })
            })
            .collect();

        Self { emails, phones }
    }
}

#[async_trait]
impl ContactEnricher for ApolloEnricher {
    async fn enrich(&self, profile_url: &str) -> Result<EnrichmentResponse> {
        let request = PeopleMatchRequest {
            linkedin_url: profile_url,
            reveal_personal_emails: true,
            reveal_phone_number: true,
        };

        let response = self
            .client
            .post(format!("{}/people/match", self.base_url))
            .header("X-Api-Key", self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| SourcingError::provider("enrichment", e))?;

        // Non-success means "no contact found" for this profile, not a
        // hard failure.
        if !response.status().is_success() {
            tracing::debug!(url = %profile_url, status = %response.status(), "no enrichment match");
            return Ok(EnrichmentResponse::empty());
        }

        let body: PeopleMatchResponse = response
            .json()
            .await
            .map_err(|e| SourcingError::provider("enrichment", e))?;

        Ok(body
            .person
            .map(EnrichmentResponse::from)
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "apollo"
    }
}
