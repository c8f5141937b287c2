//! Pipeline errors.
//!
//! Only fetching the upstream feed and touching the store can fail. Every
//! stage between them degrades to `None` fields instead.

use hobart_data::DataError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while running or persisting the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The raw feed could not be retrieved or decoded
    #[error("Fetch failed: {0}")]
    Data(#[from] DataError),

    /// Store error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No stored data for a ticker or CIK
    #[error("Unknown company: {0}")]
    UnknownCompany(String),

    /// A statement set without a CIK cannot be keyed in the store
    #[error("Statements have no CIK")]
    MissingCik,
}

impl PipelineError {
    /// Whether the failure came from the upstream feed.
    pub const fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Data(_))
    }
}
