//! Repository errors
//!
//! Error types for the persistence boundary. Orchestrators map these into
//! the domain error taxonomy.

use uuid::Uuid;

/// Errors surfaced by the persistence ports.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Compare-and-swap on the account version failed: the stored version
    /// no longer matches the version read at load time.
    #[error("Version conflict for account {account_id}: expected version {expected}")]
    VersionConflict { account_id: Uuid, expected: i64 },

    /// The storage uniqueness constraint on the idempotency key rejected a
    /// second PENDING record for the same key.
    #[error("Idempotency key already exists: {0}")]
    DuplicateIdempotencyKey(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Corrupt or otherwise unusable stored state (unknown status value,
    /// poisoned lock, missing row mid-operation).
    #[error("Storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, RepositoryError::VersionConflict { .. })
    }
}
