//! Store error types.

use thiserror::Error;

use crate::roster::TournamentId;

/// Persistence errors. Reported to the operator; the in-memory bracket is
/// retained so a failed save can be retried.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Bracket payload (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Tournament row does not exist
    #[error("tournament not found: {0}")]
    TournamentNotFound(TournamentId),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
