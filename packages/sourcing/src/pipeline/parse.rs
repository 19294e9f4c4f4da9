//! Parse stage: model-backed extraction with a deterministic fallback.
//!
//! Failure handling is three-tiered per profile:
//! 1. the model returned an array instead of an object: recover by taking
//!    the first element if it satisfies the mandatory fields;
//! 2. recovery failed or the call errored: fall back to a deterministic
//!    manual extractor over the cleaned input;
//! 3. even the mandatory fields cannot be derived: drop the profile with
//!    a logged reason.

use chrono::Datelike;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::error::{Result, SourcingError};
use crate::pipeline::batch::settle_all;
use crate::traits::ai::ProfileExtractor;
use crate::traits::store::SourcingStore;
use crate::types::config::PipelineConfig;
use crate::types::job::SourcingJob;
use crate::types::profile::{ExperienceEntry, ParsedProfile, ScrapedProfile, MAX_SKILLS};

static YEAR_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<start>(?:19|20)\d{2})\s*[–—-]\s*(?P<end>(?:19|20)\d{2}|[Pp]resent)")
        .expect("year-range pattern is valid")
});
static YEARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:yrs?|years?)\b").expect("years pattern is valid"));
static MONTHS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:mos?|months?)\b").expect("months pattern is valid")
});

/// Parse a free-text role duration into years.
///
/// Supports "2019 – Present" / "2016 – 2019" ranges and "3 yrs 4 mos"
/// style spans.
pub fn parse_duration_years(text: &str) -> Option<f32> {
    if let Some(caps) = YEAR_RANGE_RE.captures(text) {
        let start: i32 = caps["start"].parse().ok()?;
        let end_text = &caps["end"];
        let end: i32 = if end_text.eq_ignore_ascii_case("present") {
            chrono::Utc::now().year()
        } else {
            end_text.parse().ok()?
        };
        return Some((end - start).max(0) as f32);
    }

    let years = YEARS_RE
        .captures(text)
        .and_then(|c| c[1].parse::<f32>().ok());
    let months = MONTHS_RE
        .captures(text)
        .and_then(|c| c[1].parse::<f32>().ok());

    match (years, months) {
        (None, None) => None,
        (y, m) => Some(y.unwrap_or(0.0) + m.unwrap_or(0.0) / 12.0),
    }
}

/// Validate and strip a raw scrape payload down to usable fields.
///
/// Returns `None` for anything that is not a non-empty JSON object once
/// null and blank-string entries are removed.
pub fn clean_profile(raw: &Value) -> Option<Value> {
    let obj = raw.as_object()?;
    let cleaned: Map<String, Value> = obj
        .iter()
        .filter(|(_, v)| {
            !v.is_null() && !matches!(v, Value::String(s) if s.trim().is_empty())
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(Value::Object(cleaned))
    }
}

/// Wire shape for the extraction model's output.
#[derive(Debug, Deserialize)]
struct AiProfileResponse {
    #[serde(default, alias = "fullName", alias = "name")]
    full_name: Option<String>,
    #[serde(default, alias = "profileUrl", alias = "url", alias = "linkedinUrl")]
    profile_url: Option<String>,
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, alias = "currentTitle", alias = "title")]
    current_title: Option<String>,
    #[serde(default, alias = "currentCompany", alias = "company")]
    current_company: Option<String>,
    #[serde(default, alias = "photoUrl")]
    photo_url: Option<String>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    experience: Vec<AiExperienceEntry>,
    #[serde(default, alias = "experienceYears")]
    experience_years: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct AiExperienceEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default, alias = "dates")]
    duration: Option<String>,
}

/// Interpret the extraction model's output, recovering from the one
/// malformed shape models actually produce: an array wrapping the object.
///
/// `fallback_url` stands in when the model omitted the profile URL; the
/// scrape already knows it, so only a missing name is unrecoverable.
pub fn parse_extractor_output(value: &Value, fallback_url: &str) -> Option<ParsedProfile> {
    let object = match value {
        Value::Object(_) => value.clone(),
        Value::Array(items) => items.first()?.clone(),
        _ => return None,
    };

    let response: AiProfileResponse = serde_json::from_value(object).ok()?;
    let full_name = non_empty(response.full_name)?;
    let profile_url = non_empty(response.profile_url).unwrap_or_else(|| fallback_url.to_string());

    let experience: Vec<ExperienceEntry> = response
        .experience
        .into_iter()
        .map(|e| ExperienceEntry {
            title: non_empty(e.title),
            company: non_empty(e.company),
            duration: non_empty(e.duration),
        })
        .collect();
    let experience_years = response
        .experience_years
        .or_else(|| sum_duration_years(&experience));

    Some(
        ParsedProfile {
            full_name,
            profile_url,
            headline: non_empty(response.headline),
            location: non_empty(response.location),
            current_title: non_empty(response.current_title),
            current_company: non_empty(response.current_company),
            photo_url: non_empty(response.photo_url),
            skills: response.skills,
            experience,
            experience_years,
        }
        .cap_skills(),
    )
}

/// Deterministic extractor over the cleaned input, used when the model
/// fails. Pulls fields by presence across the aliases scrape payloads
/// actually use.
pub fn manual_extract(cleaned: &Value, fallback_url: &str) -> Option<ParsedProfile> {
    let obj = cleaned.as_object()?;

    let full_name = string_field(obj, &["fullName", "full_name", "name"]).or_else(|| {
        let first = string_field(obj, &["firstName", "first_name"])?;
        let last = string_field(obj, &["lastName", "last_name"])?;
        Some(format!("{first} {last}"))
    })?;

    let profile_url = string_field(
        obj,
        &[
            "profileUrl",
            "profile_url",
            "url",
            "publicProfileUrl",
            "linkedinUrl",
        ],
    )
    .unwrap_or_else(|| fallback_url.to_string());

    let experience = experience_entries(obj);
    let experience_years = number_field(obj, &["experienceYears", "experience_years", "totalYears"])
        .or_else(|| sum_duration_years(&experience));

    Some(
        ParsedProfile {
            full_name,
            profile_url,
            headline: string_field(obj, &["headline", "subTitle", "sub_title"]),
            location: string_field(obj, &["location", "city", "geoLocationName"]),
            current_title: string_field(obj, &["currentTitle", "title", "jobTitle", "position"]),
            current_company: string_field(
                obj,
                &["currentCompany", "company", "companyName", "organization"],
            ),
            photo_url: string_field(obj, &["photoUrl", "photo_url", "avatarUrl", "pictureUrl"]),
            skills: skill_list(obj),
            experience,
            experience_years,
        }
        .cap_skills(),
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    })
}

fn number_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f32> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_f64).map(|n| n as f32))
}

fn skill_list(obj: &Map<String, Value>) -> Vec<String> {
    let Some(items) = obj.get("skills").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(skill) => string_field(skill, &["name", "skill"]),
            _ => None,
        })
        .take(MAX_SKILLS)
        .collect()
}

fn experience_entries(obj: &Map<String, Value>) -> Vec<ExperienceEntry> {
    let items = ["experience", "positions", "workExperience", "work_experience"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array));
    let Some(items) = items else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|entry| ExperienceEntry {
            title: string_field(entry, &["title", "role", "position"]),
            company: string_field(entry, &["company", "companyName", "organization"]),
            duration: string_field(entry, &["duration", "dates", "dateRange", "period"]),
        })
        .collect()
}

/// Total experience years by summing per-role durations.
fn sum_duration_years(experience: &[ExperienceEntry]) -> Option<f32> {
    let parsed: Vec<f32> = experience
        .iter()
        .filter_map(|e| e.duration.as_deref())
        .filter_map(parse_duration_years)
        .collect();
    if parsed.is_empty() {
        None
    } else {
        Some(parsed.iter().sum())
    }
}

/// Run the full cascade for one scraped profile.
async fn parse_one(
    scraped: &ScrapedProfile,
    extractor: &dyn ProfileExtractor,
) -> Result<ParsedProfile> {
    let raw = scraped
        .raw
        .as_ref()
        .ok_or_else(|| SourcingError::Extraction {
            reason: "scraped profile has no payload".into(),
        })?;
    let cleaned = clean_profile(raw).ok_or_else(|| SourcingError::Extraction {
        reason: "payload is not a usable object".into(),
    })?;

    match extractor.extract(&cleaned).await {
        Ok(output) => {
            if let Some(profile) = parse_extractor_output(&output, &scraped.url) {
                return Ok(profile);
            }
            warn!(url = %scraped.url, "model output unusable, trying manual extraction");
        }
        Err(e) => {
            warn!(url = %scraped.url, error = %e, "extraction call failed, trying manual extraction");
        }
    }

    manual_extract(&cleaned, &scraped.url).ok_or_else(|| SourcingError::Extraction {
        reason: "mandatory fields missing after manual extraction".into(),
    })
}

/// Parse scraped profiles not yet present in the parse checkpoint.
///
/// Batches are smaller than scrape/save batches because model calls are
/// slower and costlier; within a batch, calls fan out under the worker
/// limit and settle together. The cumulative result list is checkpointed
/// after every batch, exactly like the scrape stage's.
pub async fn run_parse<S: SourcingStore>(
    job: &mut SourcingJob,
    store: &S,
    extractor: &dyn ProfileExtractor,
    config: &PipelineConfig,
) -> Result<()> {
    let scraped = job.scrape_checkpoint.clone().unwrap_or_default();
    let mut checkpoint = job.parse_checkpoint.clone().unwrap_or_default();
    let done: HashSet<String> = checkpoint.parsed_urls();

    let pending: Vec<ScrapedProfile> = scraped
        .profiles
        .into_iter()
        .filter(|p| p.succeeded && !done.contains(&p.url))
        .collect();

    info!(
        job_id = %job.id,
        pending = pending.len(),
        already_parsed = done.len(),
        "starting parse"
    );

    for batch in pending.chunks(config.parse_batch_size) {
        let tasks = batch.iter().map(|scraped| parse_one(scraped, extractor));
        let results = settle_all(tasks, config.ai_concurrency).await;

        for (scraped, result) in batch.iter().zip(results) {
            match result {
                Ok(profile) => checkpoint.profiles.push(profile),
                Err(e) => {
                    warn!(job_id = %job.id, url = %scraped.url, reason = %e, "dropping profile");
                }
            }
        }

        job.parse_checkpoint = Some(checkpoint.clone());
        job.progress.parsed = checkpoint.profiles.len();
        job.touch();
        store.update_job(job).await?;
    }

    info!(
        job_id = %job.id,
        parsed = checkpoint.profiles.len(),
        "parse complete"
    );

    Ok(())
}
