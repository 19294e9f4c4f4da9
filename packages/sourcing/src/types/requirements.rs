//! Structured job requirements and the search-query cascade built from them.

use serde::{Deserialize, Serialize};

use crate::types::candidate::SeniorityLevel;

/// Structured hiring requirements derived from a raw job description.
///
/// Produced once by the formatting stage and reused by query generation
/// and scoring. `titles` is ordered most senior first; the loose search
/// variant relies on that ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRequirements {
    /// Acceptable role titles, most senior first
    pub titles: Vec<String>,

    /// Skills the role cannot do without
    pub required_skills: Vec<String>,

    /// Skills that are a bonus but not required
    pub nice_to_have_skills: Vec<String>,

    /// Target location, if the role is location-bound
    pub location: Option<String>,

    /// Target industry, if relevant
    pub industry: Option<String>,

    /// Minimum years of relevant experience
    pub min_years: Option<f32>,

    /// Expected seniority band
    pub seniority: Option<SeniorityLevel>,
}

impl JobRequirements {
    /// The single most senior acceptable title, used by the loose variant.
    pub fn top_title(&self) -> Option<&str> {
        self.titles.first().map(String::as_str)
    }
}

/// Search filters derived from requirements.
///
/// Kept on the job row so a resumed run sees exactly the filters the
/// original run derived, even if requirement derivation would differ today.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub keywords: Vec<String>,
    pub titles: Vec<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
}

impl SearchFilters {
    /// Derive the full filter set from structured requirements.
    pub fn from_requirements(requirements: &JobRequirements) -> Self {
        Self {
            keywords: requirements.required_skills.clone(),
            titles: requirements.titles.clone(),
            location: requirements.location.clone(),
            industry: requirements.industry.clone(),
        }
    }
}

/// Which rung of the precision → recall ladder a query variant sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariantKind {
    /// Full derived filter set
    Precise,
    /// Industry dropped, titles truncated
    Broad,
    /// Built from nice-to-have skills instead of required skills
    Alternative,
    /// Single most senior title plus location only
    Loose,
}

/// One executable search query.
///
/// The orchestrator walks variants in order on each retry iteration; the
/// ordering encodes the search-quality degradation under sparse results
/// and must not be reshuffled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryVariant {
    pub kind: VariantKind,
    pub keywords: Vec<String>,
    pub titles: Vec<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
}

impl QueryVariant {
    /// Keywords joined for providers that take a single query string.
    pub fn keyword_query(&self) -> String {
        self.keywords.join(" ")
    }
}
