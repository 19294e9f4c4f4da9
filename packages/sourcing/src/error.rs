//! Typed errors for the sourcing pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! The taxonomy mirrors how failures propagate:
//! - [`SourcingError::Config`] is fatal: the job is marked failed and is not
//!   retryable.
//! - [`SourcingError::Provider`] and [`SourcingError::Storage`] are
//!   stage-level transients: recorded on the job as retryable, safe to
//!   re-invoke thanks to the checkpoint design.
//! - Item-level failures (one profile failing to parse, score, or save) are
//!   swallowed with a log inside the stages and never surface here.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during pipeline operations.
#[derive(Debug, Error)]
pub enum SourcingError {
    /// Missing or invalid configuration (e.g. provider credentials)
    #[error("configuration error: {0}")]
    Config(String),

    /// An external provider call failed
    #[error("{provider} provider error: {source}")]
    Provider {
        provider: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Job not found in the store
    #[error("job not found: {id}")]
    JobNotFound { id: Uuid },

    /// Job input is unusable
    #[error("invalid job: {reason}")]
    InvalidJob { reason: String },

    /// A profile could not be reduced to the mandatory fields
    #[error("profile extraction failed: {reason}")]
    Extraction { reason: String },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl SourcingError {
    /// Wrap an external provider failure.
    pub fn provider(
        provider: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Provider {
            provider,
            source: source.into(),
        }
    }

    /// Wrap a storage failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage(source.into())
    }

    /// Whether a failed stage can safely be re-invoked.
    ///
    /// Configuration and input errors are permanent; provider and storage
    /// errors are transient and the checkpoint design makes re-running safe.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Storage(_))
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, SourcingError>;
