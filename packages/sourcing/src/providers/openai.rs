//! OpenAI-backed model adapters: requirements formatting, profile
//! extraction, and candidate scoring.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SourcingError};
use crate::pipeline::prompts::{
    format_extract_prompt, format_requirements_prompt, format_score_prompt,
};
use crate::security::SecretString;
use crate::traits::ai::{
    CandidateScorer, ProfileExtractor, RequirementsFormatter, ScoreResponse,
};
use crate::types::candidate::{Candidate, SeniorityLevel};
use crate::types::requirements::JobRequirements;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const SYSTEM_PROMPT: &str =
    "You are a recruiting assistant. Always answer with a single JSON object \
     matching the requested shape exactly.";

/// OpenAI chat-completions client for the pipeline's three model roles.
///
/// Uses JSON response mode so the model is constrained to one object; the
/// parse stage still owns recovery for the shapes that slip through.
pub struct OpenAiModel {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAiModel {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: SecretString::new(api_key),
            model: "gpt-4o".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: SecretString::from_env("OPENAI_API_KEY")?,
            model: "gpt-4o".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Set the chat model (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// One JSON-mode chat completion, parsed into a `Value`.
    async fn chat_json(&self, user_prompt: &str) -> Result<Value> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            format_type: &'static str,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            response_format: ResponseFormat,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMessage,
        }

        #[derive(Deserialize)]
        struct ChoiceMessage {
            content: String,
        }

        let request = Request {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: user_prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            temperature: 0.2,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| SourcingError::provider("openai", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourcingError::provider(
                "openai",
                format!("OpenAI API error: {status}"),
            ));
        }

        let body: Response = response
            .json()
            .await
            .map_err(|e| SourcingError::provider("openai", e))?;

        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| SourcingError::provider("openai", "empty completion"))?;

        serde_json::from_str(content).map_err(|e| SourcingError::provider("openai", e))
    }
}

/// Wire shape for requirements formatting; loose strings are normalized
/// into the typed domain model here.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RequirementsWire {
    titles: Vec<String>,
    required_skills: Vec<String>,
    nice_to_have_skills: Vec<String>,
    location: Option<String>,
    industry: Option<String>,
    min_years: Option<f32>,
    seniority: Option<String>,
}

impl From<RequirementsWire> for JobRequirements {
    fn from(wire: RequirementsWire) -> Self {
        Self {
            titles: wire.titles,
            required_skills: wire.required_skills,
            nice_to_have_skills: wire.nice_to_have_skills,
            location: wire.location,
            industry: wire.industry,
            min_years: wire.min_years,
            seniority: wire.seniority.as_deref().and_then(SeniorityLevel::from_label),
        }
    }
}

#[async_trait]
impl RequirementsFormatter for OpenAiModel {
    async fn format_requirements(&self, description: &str) -> Result<JobRequirements> {
        let output = self
            .chat_json(&format_requirements_prompt(description))
            .await?;
        let wire: RequirementsWire =
            serde_json::from_value(output).map_err(|e| SourcingError::provider("openai", e))?;
        Ok(wire.into())
    }
}

#[async_trait]
impl ProfileExtractor for OpenAiModel {
    async fn extract(&self, profile: &Value) -> Result<Value> {
        self.chat_json(&format_extract_prompt(profile)).await
    }
}

#[async_trait]
impl CandidateScorer for OpenAiModel {
    async fn score(
        &self,
        candidate: &Candidate,
        description: &str,
        requirements: &JobRequirements,
    ) -> Result<ScoreResponse> {
        let output = self
            .chat_json(&format_score_prompt(candidate, description, requirements))
            .await?;
        serde_json::from_value(output).map_err(|e| SourcingError::provider("openai", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirements_wire_normalizes_seniority() {
        let wire: RequirementsWire = serde_json::from_value(serde_json::json!({
            "titles": ["Staff Engineer"],
            "required_skills": ["Rust"],
            "seniority": "Senior level"
        }))
        .unwrap();
        let requirements = JobRequirements::from(wire);
        assert_eq!(requirements.seniority, Some(SeniorityLevel::Senior));
        assert_eq!(requirements.titles, vec!["Staff Engineer"]);
    }

    #[test]
    fn score_wire_tolerates_missing_fields() {
        let response: ScoreResponse = serde_json::from_value(serde_json::json!({
            "skills_match": 22,
            "reasoning": "solid overlap"
        }))
        .unwrap();
        assert_eq!(response.skills_match, 22);
        assert_eq!(response.experience_fit, 0);
        assert!(response.matched_skills.is_empty());
    }
}
