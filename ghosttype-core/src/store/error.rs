//! Store error types

use thiserror::Error;

/// Errors from the persistent store.
///
/// `Database` is the transient class: callers on the predict path convert
/// it into an empty result for the cycle. `Corrupt` and `Migration` are
/// fatal at startup.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Corrupt store: {0}")]
    Corrupt(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },
}
