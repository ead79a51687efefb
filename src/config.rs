//! Engine configuration.
//!
//! All tunables live here so embedders can override them without touching
//! strategy code. The automatic-interval bucket cap is deliberately a
//! configurable parameter, not a constant.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for plan building and evaluation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Upper bound on the number of buckets an automatic date interval or
    /// an automatic numeric-variable interval may produce.
    pub max_automatic_buckets: u32,

    /// Upper bound on the number of buckets a terms aggregation requests.
    pub max_terms_buckets: usize,

    /// Default page size for raw instance listings when the caller
    /// supplies no pagination.
    pub default_raw_limit: usize,

    /// Per-store-call deadline in milliseconds. Elapsing surfaces as a
    /// cancellation error, never as a partial result.
    pub query_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_automatic_buckets: 120,
            max_terms_buckets: 1_000,
            default_raw_limit: 20,
            query_timeout_ms: 30_000,
        }
    }
}

impl EngineConfig {
    /// The store-call deadline as a [`Duration`].
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}
