//! Error types shared across the service.
//!
//! Each boundary gets its own enum so callers can tell an unrecoverable
//! store failure apart from a rejected input or an isolated per-field
//! problem. `main.rs` and configuration loading stay on `anyhow`.

use thiserror::Error;

// ---

/// Failure talking to (or decoding data from) a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    // ---
    /// The store could not be reached (pool exhausted, closed, or I/O error).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// A persisted row could not be mapped back into a model.
    #[error("invalid stored record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        // ---
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Rejected attempt to build an [`crate::models::Alert`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlertError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

/// Rejected ingestion input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    // ---
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must not exceed {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Value must be a finite number")]
    NotFinite,

    #[error("No readings provided in batch")]
    EmptyBatch,
}

/// Failure of a single ingestion request.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Problem evaluating one field. Recorded in the run summary, never fatal.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Alert(#[from] AlertError),
}

/// Failure that aborts a whole evaluation run.
#[derive(Debug, Error)]
pub enum EvaluationError {
    // ---
    #[error("failed to fetch recent readings: {0}")]
    Fetch(StoreError),

    #[error("failed to persist alerts: {0}")]
    Persist(StoreError),

    #[error("evaluation cancelled")]
    Cancelled,
}
