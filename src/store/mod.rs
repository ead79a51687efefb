//! Document store client abstraction.
//!
//! The engine issues every query through [`StoreClient`] and never sees a
//! concrete wire protocol. [`MemoryStore`] is a complete in-process
//! implementation used by the integration tests and for embedding.

mod error;
mod memory;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::query::{SearchQuery, SearchResponse};

/// Executes composite queries against the backing document store.
///
/// Implementations must support terms, histogram and date-histogram
/// bucket aggregations, filter/nested single-bucket aggregations, numeric
/// metric aggregations, per-aggregation naming, and nesting depth ≥ 2.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> StoreResult<SearchResponse>;
}
