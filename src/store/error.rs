//! Store-specific error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors a store client may surface.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached or refused the request. Transient;
    /// retry policy is the caller's concern.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store-side call was cancelled or timed out.
    #[error("store call timed out after {0} ms")]
    Timeout(u64),

    /// A queried field is absent in the store's mapping.
    #[error("field not mapped: {0}")]
    MissingField(String),

    /// The query is malformed for this store (bad timezone, bad interval).
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
