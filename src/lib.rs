//! # Facet
//!
//! A report execution-plan engine: compiles analytical report definitions
//! into a single composite bucket-aggregation query against a backing
//! document store, executes it, and decodes the nested result into a typed
//! result shape.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │       ReportDefinition (view × group-by × distribution)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [plan builder + validation]
//! ┌─────────────────────────────────────────────────────────┐
//! │       ExecutionPlan (immutable, cached by command key)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [min/max pre-queries, assembly]
//! ┌─────────────────────────────────────────────────────────┐
//! │     SearchQuery (filter + nested aggregation tree)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [store client]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Bucket tree → decoder → TypedResult (+ sorting)      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! A plan is assembled from exactly one view strategy, one group-by
//! strategy and one distributed-by strategy; "none" is itself a strategy,
//! never an absence. Strategy axes are closed enums matched exhaustively,
//! so illegal combinations are rejected once, at build time.

pub mod cache;
pub mod config;
pub mod engine;
pub mod enhancer;
pub mod meta;
pub mod model;
pub mod plan;
pub mod query;
pub mod result;
pub mod stats;
pub mod store;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::cache::PlanCache;
    pub use crate::config::EngineConfig;
    pub use crate::engine::ReportEngine;
    pub use crate::enhancer::{DefaultFilterEnhancer, FilterEnhancer};
    pub use crate::meta::{DefinitionMetadata, LabelKind, NoMetadata};
    pub use crate::model::{
        AggregationType, ColumnSelection, DateDimension, DateUnit, DateUnitConfig,
        DistributedByConfig, Filter, GroupByConfig, IdentityDimension, Pagination,
        ReportDefinition, SortBy, SortConfig, SortOrder, SubjectType, UserTaskDurationVariant,
        VariableType, ViewConfig,
    };
    pub use crate::plan::{
        is_combinable, EvaluationError, ExecutionContext, ExecutionPlan, IdentifierStack,
        PlanConfigurationError,
    };
    pub use crate::result::{HyperMapEntry, MapEntry, ReportData, ResultType, TypedResult};
    pub use crate::store::{MemoryStore, StoreClient, StoreError};
}
