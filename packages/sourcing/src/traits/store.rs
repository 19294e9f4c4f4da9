//! Storage ports for jobs and candidates.
//!
//! The storage layer is split into focused traits:
//! - `JobStore`: the durable job row, the single source of truth for resume
//! - `CandidateStore`: candidate rows and the queries the stages need
//! - `SourcingStore`: composite trait combining both
//!
//! Durability and idempotency are what the pipeline requires of a backend,
//! not a particular technology: `insert_candidate` must be a no-op when a
//! row for the same `(job_id, profile_url)` already exists, and
//! `update_job` must be an atomic whole-row write keyed by job id. There
//! is at most one active execution per job id (caller's invariant), so
//! whole-row writes cannot race.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::candidate::{Candidate, CandidateScore};
use crate::types::job::SourcingJob;

/// Sort key for candidate listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSort {
    /// Rubric total; unscored rows rank lowest
    Score,
    CreatedAt,
    Name,
}

/// Query options for the candidate listing exposed to dashboards.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub sort: CandidateSort,
    pub descending: bool,
    pub offset: usize,
    pub limit: Option<usize>,
    pub only_scored: bool,
    pub min_score: Option<u8>,
}

impl Default for CandidateQuery {
    fn default() -> Self {
        Self {
            sort: CandidateSort::CreatedAt,
            descending: false,
            offset: 0,
            limit: None,
            only_scored: false,
            min_score: None,
        }
    }
}

impl CandidateQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sorted_by(mut self, sort: CandidateSort, descending: bool) -> Self {
        self.sort = sort;
        self.descending = descending;
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    pub fn only_scored(mut self) -> Self {
        self.only_scored = true;
        self
    }

    pub fn with_min_score(mut self, min: u8) -> Self {
        self.min_score = Some(min);
        self
    }
}

/// Durable store for job rows.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a freshly created job. Fails if the id already exists.
    async fn create_job(&self, job: &SourcingJob) -> Result<()>;

    async fn get_job(&self, id: Uuid) -> Result<Option<SourcingJob>>;

    /// Whole-row write keyed by job id. Every checkpoint goes through here.
    async fn update_job(&self, job: &SourcingJob) -> Result<()>;
}

/// Durable store for candidate rows.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Insert a candidate. Inserting a second row for the same
    /// `(job_id, profile_url)` is a no-op, never a duplicate.
    async fn insert_candidate(&self, candidate: &Candidate) -> Result<()>;

    /// Update an existing row by candidate id.
    async fn update_candidate(&self, candidate: &Candidate) -> Result<()>;

    async fn candidate_exists(&self, job_id: Uuid, profile_url: &str) -> Result<bool>;

    async fn get_candidate_by_url(
        &self,
        job_id: Uuid,
        profile_url: &str,
    ) -> Result<Option<Candidate>>;

    /// Candidates that passed the contact gate for this job.
    async fn count_contactable(&self, job_id: Uuid) -> Result<usize>;

    /// Paginated, sortable, filterable candidate listing.
    async fn get_candidates(&self, job_id: Uuid, query: &CandidateQuery)
        -> Result<Vec<Candidate>>;

    /// Saved-but-unscored candidates, up to `limit`.
    ///
    /// Resume-safe by construction: scored rows are excluded by their
    /// status flag, so no separate checkpoint structure is needed.
    async fn find_unscored(&self, job_id: Uuid, limit: usize) -> Result<Vec<Candidate>>;

    /// Attach a score to a row and flip its scored flag.
    async fn apply_score(&self, candidate_id: Uuid, score: &CandidateScore) -> Result<()>;

    /// Earliest other job (same owner) that already sourced this URL.
    async fn find_first_seen(
        &self,
        owner_id: Uuid,
        profile_url: &str,
        excluding_job: Uuid,
    ) -> Result<Option<Uuid>>;
}

/// Composite storage trait used by the orchestrator.
pub trait SourcingStore: JobStore + CandidateStore {}

// Blanket implementation: anything implementing both is a SourcingStore
impl<T: JobStore + CandidateStore> SourcingStore for T {}
