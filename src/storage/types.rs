use thiserror::Error;

/// History-store errors.
///
/// The store is the run's correctness backbone: without it every item
/// would be re-downloaded. Callers treat any of these as fatal and abort
/// the run with a non-zero status.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store file could not be opened or created
    #[error("Failed to open history store: {0}")]
    Open(String),

    /// Schema creation failed
    #[error("History migration failed: {0}")]
    Migration(String),

    /// A lookup or insert failed
    #[error("History query failed: {0}")]
    Query(#[from] sqlx::Error),
}
