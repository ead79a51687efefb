//! Plan-level error taxonomy.
//!
//! Configuration errors are raised at build time only and are fatal to
//! that plan; evaluation errors bubble unchanged to the caller. The
//! engine performs no logging-as-recovery and no silent fallback.

use thiserror::Error;

use crate::store::StoreError;

/// Illegal plan configurations, rejected before any store contact.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanConfigurationError {
    /// The view/group-by/distributed-by triple cannot be expressed as one
    /// nested bucket aggregation.
    #[error("illegal combination: view '{view}', group by '{group_by}', distributed by '{distributed_by}'")]
    IllegalCombination {
        view: String,
        group_by: String,
        distributed_by: String,
    },

    /// The requested result shape does not match the dimension
    /// combination.
    #[error("result shape '{requested}' does not fit this plan, expected '{expected}'")]
    ShapeMismatch { requested: String, expected: String },

    /// A field the view requires is not exposed by the resolved
    /// definition versions.
    #[error("view requires field '{field}' which the resolved definition versions do not expose")]
    UnsupportedViewForVersion { field: String },

    /// Percentile parameter outside `(0, 100]`.
    #[error("percentile must be in (0, 100], got {0}")]
    InvalidPercentile(f64),

    /// The view is not defined for the report's subject type.
    #[error("view '{view}' is not available for subject '{subject}'")]
    InvalidSubject { subject: String, view: String },
}

/// Result type for evaluation.
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors surfaced by `evaluate()`.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Configuration(#[from] PlanConfigurationError),

    /// Transient store failure; the engine does not retry internally.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A store call was cancelled or exceeded its deadline. No partial
    /// results are surfaced.
    #[error("evaluation cancelled: {0}")]
    Cancelled(String),

    /// A field required by a strategy is absent in the store mapping.
    #[error("missing field: {0}")]
    MissingField(String),

    /// The store response did not contain the aggregation structure the
    /// plan asked for.
    #[error("failed to decode store response: {0}")]
    Decode(String),
}

impl From<StoreError> for EvaluationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => EvaluationError::StoreUnavailable(msg),
            StoreError::Timeout(ms) => {
                EvaluationError::Cancelled(format!("store call timed out after {ms} ms"))
            }
            StoreError::MissingField(field) => EvaluationError::MissingField(field),
            StoreError::InvalidQuery(msg) => EvaluationError::Decode(msg),
        }
    }
}
