//! Contact-enrichment provider contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Classification of an email address returned by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    Personal,
    Work,
}

/// One email address with the metadata the selection policy needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecord {
    pub address: String,
    pub email_type: Option<EmailType>,
    pub verified: bool,
}

impl EmailRecord {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            email_type: None,
            verified: false,
        }
    }

    pub fn personal(address: impl Into<String>, verified: bool) -> Self {
        Self {
            address: address.into(),
            email_type: Some(EmailType::Personal),
            verified,
        }
    }

    pub fn work(address: impl Into<String>, verified: bool) -> Self {
        Self {
            address: address.into(),
            email_type: Some(EmailType::Work),
            verified,
        }
    }
}

/// One phone number with its provider-reported type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneRecord {
    pub number: String,
    /// Provider-reported type label, e.g. "work_hq" or "mobile"
    pub phone_type: Option<String>,
}

/// Everything the provider found for one profile URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentResponse {
    pub emails: Vec<EmailRecord>,
    pub phones: Vec<PhoneRecord>,
}

impl EnrichmentResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_email(&self) -> bool {
        !self.emails.is_empty()
    }
}

/// Contact-enrichment provider.
///
/// Externally rate-limited: the enrich stage spaces calls with a mandatory
/// fixed delay and never runs them concurrently. Implementations must map
/// non-success provider responses to an empty `EnrichmentResponse` ("no
/// contact found") rather than an error.
#[async_trait]
pub trait ContactEnricher: Send + Sync {
    /// Look up contact methods for a profile URL.
    async fn enrich(&self, profile_url: &str) -> Result<EnrichmentResponse>;

    /// Label recorded as `contact_source` on candidates this provider fills.
    fn name(&self) -> &'static str {
        "enrichment"
    }
}
