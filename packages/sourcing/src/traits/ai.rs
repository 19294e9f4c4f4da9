//! Model contracts: requirements formatting, structured extraction, scoring.
//!
//! Implementations wrap specific LLM providers and own the prompting and
//! wire-level response shapes; the pipeline owns recovery and clamping.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::candidate::Candidate;
use crate::types::requirements::JobRequirements;

/// Derives structured hiring requirements from a raw job description.
#[async_trait]
pub trait RequirementsFormatter: Send + Sync {
    async fn format_requirements(&self, description: &str) -> Result<JobRequirements>;
}

/// Schema-prompted structured extraction over a cleaned scraped profile.
///
/// The model is instructed to return a single object with two mandatory
/// fields (full name, profile URL), but may legally return malformed
/// shapes: an array instead of an object, missing fields. The parse
/// stage owns the recovery and fallback cascade; implementations just
/// hand back whatever JSON the model produced.
#[async_trait]
pub trait ProfileExtractor: Send + Sync {
    async fn extract(&self, profile: &Value) -> Result<Value>;
}

/// Raw rubric result from the scoring model, before clamping.
///
/// Numeric fields are deliberately wider than the rubric bands and string
/// fields deliberately loose; `CandidateScore::from_response` normalizes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreResponse {
    pub skills_match: u32,
    pub experience_fit: u32,
    pub industry_relevance: u32,
    pub title_fit: u32,
    pub bonus: u32,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub bonus_skills: Vec<String>,
    /// Years in similar roles, not total career
    pub relevant_years: f32,
    pub seniority: Option<String>,
    pub industry_match: Option<String>,
    pub reasoning: String,
}

/// Scores one candidate against the job's requirements.
#[async_trait]
pub trait CandidateScorer: Send + Sync {
    async fn score(
        &self,
        candidate: &Candidate,
        description: &str,
        requirements: &JobRequirements,
    ) -> Result<ScoreResponse>;
}
