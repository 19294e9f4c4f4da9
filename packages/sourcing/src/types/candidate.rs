//! Candidate rows and the scoring rubric.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::traits::ai::ScoreResponse;
use crate::types::profile::ParsedProfile;

/// How far through the pipeline a candidate has travelled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    /// Contact method found, row created
    Enriched,
    Scraped,
    Parsed,
    /// Parsed profile fields persisted onto the row
    Saved,
    Scored,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enriched => "ENRICHED",
            Self::Scraped => "SCRAPED",
            Self::Parsed => "PARSED",
            Self::Saved => "SAVED",
            Self::Scored => "SCORED",
        }
    }
}

/// Seniority band reported by the scoring model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityLevel {
    Entry,
    Mid,
    Senior,
    Lead,
    Principal,
    Executive,
}

impl SeniorityLevel {
    /// Parse a free-form label from a model response.
    ///
    /// Models phrase seniority loosely ("mid-level", "Staff Engineer"), so
    /// matching is substring-based and case-insensitive.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        if label.contains("entry") || label.contains("junior") || label.contains("intern") {
            Some(Self::Entry)
        } else if label.contains("principal") {
            Some(Self::Principal)
        } else if label.contains("lead") || label.contains("staff") {
            Some(Self::Lead)
        } else if label.contains("exec")
            || label.contains("director")
            || label.contains("vp")
            || label.contains("chief")
        {
            Some(Self::Executive)
        } else if label.contains("senior") {
            Some(Self::Senior)
        } else if label.contains("mid") {
            Some(Self::Mid)
        } else {
            None
        }
    }
}

/// How well a candidate's industry background matches the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryMatch {
    Match,
    Adjacent,
    Mismatch,
}

impl IndustryMatch {
    /// Parse a free-form label from a model response.
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("adjacent") || label.contains("related") || label.contains("partial") {
            Self::Adjacent
        } else if label.contains("mismatch") || label.contains("no") {
            Self::Mismatch
        } else if label.contains("match") || label.contains("strong") || label.contains("yes") {
            Self::Match
        } else {
            Self::Mismatch
        }
    }
}

/// Rubric component ceilings. The total is always the sum of components.
pub const MAX_SKILLS_MATCH: u8 = 25;
pub const MAX_EXPERIENCE_FIT: u8 = 25;
pub const MAX_INDUSTRY_RELEVANCE: u8 = 20;
pub const MAX_TITLE_FIT: u8 = 15;
pub const MAX_BONUS: u8 = 10;

/// The 0–100 multi-component match score for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Skills match, 0–25
    pub skills_match: u8,
    /// Experience-level fit, 0–25
    pub experience_fit: u8,
    /// Industry relevance, 0–20
    pub industry_relevance: u8,
    /// Title/seniority fit, 0–15
    pub title_fit: u8,
    /// Nice-to-have bonus, 0–10
    pub bonus: u8,
    /// Sum of the five components, 0–100
    pub total: u8,

    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub bonus_skills: Vec<String>,

    /// Years in similar roles, not total career length
    pub relevant_years: f32,
    pub seniority: Option<SeniorityLevel>,
    pub industry_match: Option<IndustryMatch>,
    pub reasoning: String,
}

impl CandidateScore {
    /// Build a score from a raw model response, clamping each component to
    /// its rubric band and recomputing the total as the component sum.
    pub fn from_response(response: ScoreResponse) -> Self {
        let skills_match = clamp(response.skills_match, MAX_SKILLS_MATCH);
        let experience_fit = clamp(response.experience_fit, MAX_EXPERIENCE_FIT);
        let industry_relevance = clamp(response.industry_relevance, MAX_INDUSTRY_RELEVANCE);
        let title_fit = clamp(response.title_fit, MAX_TITLE_FIT);
        let bonus = clamp(response.bonus, MAX_BONUS);

        Self {
            skills_match,
            experience_fit,
            industry_relevance,
            title_fit,
            bonus,
            total: skills_match + experience_fit + industry_relevance + title_fit + bonus,
            matched_skills: response.matched_skills,
            missing_skills: response.missing_skills,
            bonus_skills: response.bonus_skills,
            relevant_years: response.relevant_years.max(0.0),
            seniority: response
                .seniority
                .as_deref()
                .and_then(SeniorityLevel::from_label),
            industry_match: response
                .industry_match
                .as_deref()
                .map(IndustryMatch::from_label),
            reasoning: response.reasoning,
        }
    }
}

fn clamp(value: u32, max: u8) -> u8 {
    value.min(max as u32) as u8
}

/// The contact method selected for a profile by the enrichment policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    pub phone: Option<String>,
    pub source: Option<String>,
}

/// One discovered, contactable profile attached to a job.
///
/// Identity is `(job_id, profile_url)`; the store guarantees a second
/// insert for the same pair is a no-op, which is what makes every stage
/// safely re-runnable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub job_id: Uuid,
    pub owner_id: Uuid,
    pub profile_url: String,

    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub current_title: Option<String>,
    pub current_company: Option<String>,
    pub photo_url: Option<String>,

    pub email: Option<String>,
    pub phone: Option<String>,
    pub has_contact_info: bool,
    pub contact_source: Option<String>,

    pub status: CandidateStatus,
    pub is_scored: bool,
    /// Set when the same owner sourced this profile in an earlier job.
    /// Informational lineage only; duplicates are still saved and scored.
    pub is_duplicate: bool,
    pub first_seen_job_id: Option<Uuid>,

    /// Opaque scrape payload, kept for re-parsing and audit
    pub raw_profile: Option<serde_json::Value>,
    pub skills: Vec<String>,
    pub experience_years: Option<f32>,

    pub score: Option<CandidateScore>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    /// Create the row for a profile that just passed the contact gate.
    pub fn enriched(job_id: Uuid, owner_id: Uuid, profile_url: &str, contact: ContactInfo) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            job_id,
            owner_id,
            profile_url: profile_url.to_string(),
            full_name: None,
            headline: None,
            location: None,
            current_title: None,
            current_company: None,
            photo_url: None,
            email: Some(contact.email),
            phone: contact.phone,
            has_contact_info: true,
            contact_source: contact.source,
            status: CandidateStatus::Enriched,
            is_scored: false,
            is_duplicate: false,
            first_seen_job_id: None,
            raw_profile: None,
            skills: Vec::new(),
            experience_years: None,
            score: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy parsed profile fields onto the row.
    pub fn apply_parsed(&mut self, profile: &ParsedProfile) {
        self.full_name = Some(profile.full_name.clone());
        self.headline = profile.headline.clone().or(self.headline.take());
        self.location = profile.location.clone().or(self.location.take());
        self.current_title = profile.current_title.clone().or(self.current_title.take());
        self.current_company = profile
            .current_company
            .clone()
            .or(self.current_company.take());
        self.photo_url = profile.photo_url.clone().or(self.photo_url.take());
        self.skills = profile.skills.clone();
        self.experience_years = profile.experience_years.or(self.experience_years);
    }

    /// Attach a rubric score and mark the row scored.
    pub fn apply_score(&mut self, score: CandidateScore) {
        self.score = Some(score);
        self.is_scored = true;
        self.status = CandidateStatus::Scored;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(
        skills: u32,
        experience: u32,
        industry: u32,
        title: u32,
        bonus: u32,
    ) -> ScoreResponse {
        ScoreResponse {
            skills_match: skills,
            experience_fit: experience,
            industry_relevance: industry,
            title_fit: title,
            bonus,
            ..ScoreResponse::default()
        }
    }

    #[test]
    fn score_components_are_clamped_to_rubric_bands() {
        let score = CandidateScore::from_response(response(99, 99, 99, 99, 99));
        assert_eq!(score.skills_match, 25);
        assert_eq!(score.experience_fit, 25);
        assert_eq!(score.industry_relevance, 20);
        assert_eq!(score.title_fit, 15);
        assert_eq!(score.bonus, 10);
        assert_eq!(score.total, 95);
    }

    #[test]
    fn score_total_is_component_sum() {
        let score = CandidateScore::from_response(response(20, 15, 10, 12, 3));
        assert_eq!(score.total, 60);
    }

    #[test]
    fn seniority_labels_parse_loosely() {
        assert_eq!(
            SeniorityLevel::from_label("Mid-Level"),
            Some(SeniorityLevel::Mid)
        );
        assert_eq!(
            SeniorityLevel::from_label("Staff Engineer"),
            Some(SeniorityLevel::Lead)
        );
        assert_eq!(
            SeniorityLevel::from_label("Senior"),
            Some(SeniorityLevel::Senior)
        );
        assert_eq!(
            SeniorityLevel::from_label("VP of Engineering"),
            Some(SeniorityLevel::Executive)
        );
        assert_eq!(SeniorityLevel::from_label("unknown"), None);
    }

    #[test]
    fn industry_labels_parse_loosely() {
        assert_eq!(IndustryMatch::from_label("strong match"), IndustryMatch::Match);
        assert_eq!(IndustryMatch::from_label("adjacent"), IndustryMatch::Adjacent);
        assert_eq!(IndustryMatch::from_label("???"), IndustryMatch::Mismatch);
    }

    #[test]
    fn enriched_candidate_passes_contact_gate() {
        let contact = ContactInfo {
            email: "jane@example.com".into(),
            phone: None,
            source: Some("apollo".into()),
        };
        let candidate = Candidate::enriched(Uuid::new_v4(), Uuid::new_v4(), "https://x/p", contact);
        assert!(candidate.has_contact_info);
        assert_eq!(candidate.status, CandidateStatus::Enriched);
        assert!(!candidate.is_scored);
    }
}
