//! Checkpointed, Resumable Candidate-Sourcing Pipeline
//!
//! Turns a job description into a ranked list of enriched, contactable
//! candidate profiles by coordinating several unreliable external
//! operations (search, contact enrichment, profile scraping, model-based
//! parsing, model-based scoring) across thousands of items.
//!
//! # Design Philosophy
//!
//! **The job store is the state machine.**
//!
//! - Every stage transition is decided from durable job data, never from
//!   in-memory continuation
//! - Every stage checkpoints after each batch, so a restarted process
//!   resumes without redoing completed work or re-spending provider budget
//! - Item failures stay item-sized: one bad profile never takes down a
//!   batch, a batch never takes down a stage
//! - Only contactable profiles enter the expensive stages
//!
//! # Usage
//!
//! ```rust,ignore
//! use sourcing::{run_job, submit_job, Adapters, MemoryStore, PipelineConfig};
//! use sourcing::providers::{ApifyScraper, ApolloEnricher, ApolloSearcher, OpenAiModel};
//!
//! let store = MemoryStore::new();
//! let model = OpenAiModel::from_env()?;
//! let searcher = ApolloSearcher::from_env()?;
//! let enricher = ApolloEnricher::from_env()?;
//! let scraper = ApifyScraper::from_env()?;
//!
//! let adapters = Adapters {
//!     formatter: &model,
//!     searcher: &searcher,
//!     enricher: &enricher,
//!     scraper: &scraper,
//!     extractor: &model,
//!     scorer: &model,
//! };
//!
//! let job_id = submit_job(&store, owner_id, job_description, 50).await?;
//! run_job(job_id, &store, &adapters, &PipelineConfig::default()).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Adapter and storage contracts
//! - [`types`] - Domain data model (jobs, candidates, checkpoints)
//! - [`pipeline`] - Stage functions and the orchestrating state machine
//! - [`stores`] - Storage implementations (MemoryStore, PostgresStore)
//! - [`providers`] - Real provider adapters (Apollo, Apify, OpenAI)
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod pipeline;
pub mod providers;
pub mod security;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{Result, SourcingError};
pub use traits::{
    ai::{CandidateScorer, ProfileExtractor, RequirementsFormatter, ScoreResponse},
    enricher::{ContactEnricher, EmailRecord, EmailType, EnrichmentResponse, PhoneRecord},
    scraper::ProfileScraper,
    searcher::{ProfileSearcher, SearchHit},
    store::{CandidateQuery, CandidateSort, CandidateStore, JobStore, SourcingStore},
};
pub use types::{
    candidate::{
        Candidate, CandidateScore, CandidateStatus, ContactInfo, IndustryMatch, SeniorityLevel,
    },
    config::PipelineConfig,
    job::{
        JobProgress, JobStage, JobStatus, ParseCheckpoint, ScrapeCheckpoint, SourcingJob,
        StageError,
    },
    profile::{ExperienceEntry, ParsedProfile, ScrapedProfile, MAX_SKILLS},
    requirements::{JobRequirements, QueryVariant, SearchFilters, VariantKind},
};

// Re-export pipeline entry points
pub use pipeline::{
    generate_query_variants, next_stage, run_job, settle_all, submit_job, Adapters,
    NO_CANDIDATES_MESSAGE,
};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;
