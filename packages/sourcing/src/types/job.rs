//! The durable sourcing-job record: the single source of truth for resumption.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::types::profile::{ParsedProfile, ScrapedProfile};
use crate::types::requirements::{JobRequirements, QueryVariant, SearchFilters};

/// Terminal status of a sourcing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Created,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

/// Pipeline stage label driving the state machine.
///
/// `NoCandidates` is a distinct terminal marker, not a generic failure:
/// callers present it as "adjust your requirements" rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStage {
    Formatting,
    QueryGen,
    Search,
    Enrich,
    Scrape,
    Parse,
    Save,
    Score,
    Completed,
    NoCandidates,
    Failed,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Formatting => "FORMATTING",
            Self::QueryGen => "QUERY_GEN",
            Self::Search => "SEARCH",
            Self::Enrich => "ENRICH",
            Self::Scrape => "SCRAPE",
            Self::Parse => "PARSE",
            Self::Save => "SAVE",
            Self::Score => "SCORE",
            Self::Completed => "COMPLETED",
            Self::NoCandidates => "NO_CANDIDATES",
            Self::Failed => "FAILED",
        }
    }

    /// Whether the state machine stops here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::NoCandidates | Self::Failed)
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress counters surfaced to dashboards after every checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobProgress {
    pub found: usize,
    pub scraped: usize,
    pub parsed: usize,
    pub saved: usize,
    pub scored: usize,
}

/// One entry in the job's append-only error log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageError {
    pub stage: JobStage,
    pub message: String,
    pub retryable: bool,
    pub at: DateTime<Utc>,
}

/// Cumulative scrape-stage checkpoint, persisted as a JSON blob on the job.
///
/// Holds successes and failures together; on resume only URLs not marked
/// succeeded are retried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeCheckpoint {
    pub profiles: Vec<ScrapedProfile>,
    pub succeeded: usize,
}

impl ScrapeCheckpoint {
    /// URLs that already scraped successfully and must not be re-fetched.
    pub fn succeeded_urls(&self) -> HashSet<String> {
        self.profiles
            .iter()
            .filter(|p| p.succeeded)
            .map(|p| p.url.clone())
            .collect()
    }

    /// Insert a fresh outcome, replacing any earlier attempt for the URL.
    pub fn upsert(&mut self, profile: ScrapedProfile) {
        if let Some(existing) = self.profiles.iter_mut().find(|p| p.url == profile.url) {
            *existing = profile;
        } else {
            self.profiles.push(profile);
        }
    }

    /// Recompute the derived succeeded count after a batch merge.
    pub fn recount(&mut self) {
        self.succeeded = self.profiles.iter().filter(|p| p.succeeded).count();
    }
}

/// Cumulative parse-stage checkpoint, persisted as a JSON blob on the job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseCheckpoint {
    pub profiles: Vec<ParsedProfile>,
}

impl ParseCheckpoint {
    pub fn parsed_urls(&self) -> HashSet<String> {
        self.profiles.iter().map(|p| p.profile_url.clone()).collect()
    }
}

/// Durable record of one sourcing run.
///
/// Mutated exclusively by stage functions; every state-machine decision is
/// driven by the data here rather than in-memory continuation, which is
/// what lets a restarted process resume at the correct stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcingJob {
    pub id: Uuid,
    pub owner_id: Uuid,

    pub description: String,
    pub requirements: Option<JobRequirements>,
    pub max_candidates: usize,

    pub filters: Option<SearchFilters>,
    pub query_variants: Vec<QueryVariant>,
    pub variant_index: usize,
    pub search_iterations: u32,
    /// Accumulated profile URLs, set-union across variants
    pub profile_urls: IndexSet<String>,
    /// Count of candidates that passed the contact gate
    pub candidates_with_contact: usize,

    pub progress: JobProgress,
    pub stage: JobStage,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub error_log: Vec<StageError>,

    pub scrape_checkpoint: Option<ScrapeCheckpoint>,
    pub parse_checkpoint: Option<ParseCheckpoint>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SourcingJob {
    /// Create a job at the start of the pipeline.
    pub fn new(owner_id: Uuid, description: impl Into<String>, max_candidates: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            description: description.into(),
            requirements: None,
            max_candidates,
            filters: None,
            query_variants: Vec::new(),
            variant_index: 0,
            search_iterations: 0,
            profile_urls: IndexSet::new(),
            candidates_with_contact: 0,
            progress: JobProgress::default(),
            stage: JobStage::Formatting,
            status: JobStatus::Created,
            error_message: None,
            error_log: Vec::new(),
            scrape_checkpoint: None,
            parse_checkpoint: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Provide pre-derived requirements, skipping the formatting model call.
    pub fn with_requirements(mut self, requirements: JobRequirements) -> Self {
        self.requirements = Some(requirements);
        self
    }

    /// The query variant the next search call will execute.
    pub fn current_variant(&self) -> Option<&QueryVariant> {
        self.query_variants.get(self.variant_index)
    }

    /// Move to the next fallback variant. Returns false when exhausted.
    pub fn advance_variant(&mut self) -> bool {
        if self.variant_index + 1 < self.query_variants.len() {
            self.variant_index += 1;
            true
        } else {
            false
        }
    }

    /// Append to the error log and surface the message on the job.
    pub fn record_error(&mut self, stage: JobStage, message: impl Into<String>, retryable: bool) {
        let message = message.into();
        self.error_message = Some(message.clone());
        self.error_log.push(StageError {
            stage,
            message,
            retryable,
            at: Utc::now(),
        });
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
