//! Scraped and parsed profile payloads flowing between stages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum skills carried per profile; bounds downstream payload size.
pub const MAX_SKILLS: usize = 10;

/// Outcome of scraping one profile URL, success or not.
///
/// Failures are kept in the checkpoint alongside successes so a resumed run
/// knows to retry exactly the failed URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedProfile {
    pub url: String,
    pub succeeded: bool,
    pub raw: Option<Value>,
    pub error: Option<String>,
}

impl ScrapedProfile {
    pub fn success(url: impl Into<String>, raw: Value) -> Self {
        Self {
            url: url.into(),
            succeeded: true,
            raw: Some(raw),
            error: None,
        }
    }

    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            succeeded: false,
            raw: None,
            error: Some(error.into()),
        }
    }
}

/// One role from a profile's work history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: Option<String>,
    pub company: Option<String>,
    /// Free-text duration as scraped, e.g. "2019 – Present" or "3 yrs 4 mos"
    pub duration: Option<String>,
}

/// Structured profile produced by the parse stage.
///
/// `full_name` and `profile_url` are the two mandatory fields; a profile
/// that cannot produce both is dropped rather than saved half-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedProfile {
    pub full_name: String,
    pub profile_url: String,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub current_title: Option<String>,
    pub current_company: Option<String>,
    pub photo_url: Option<String>,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub experience_years: Option<f32>,
}

impl ParsedProfile {
    /// Enforce the skills cap.
    pub fn cap_skills(mut self) -> Self {
        self.skills.truncate(MAX_SKILLS);
        self
    }
}
