//! Report definition model.
//!
//! These types describe *what* a report measures and how it is bucketed.
//! They are owned by the caller (persistence of report entities is not a
//! concern of this crate) and immutable for the duration of an evaluation.

mod fields;
mod filter;
mod report;
mod sort;

pub use fields::*;
pub use filter::{CompareOp, Filter, InstanceState};
pub use report::{
    AggregationType, ColumnSelection, DateDimension, DateUnit, DateUnitConfig,
    DistributedByConfig, GroupByConfig, IdentityDimension, ReportDefinition, SubjectType,
    UserTaskDurationVariant, VariableType, ViewConfig,
};
pub use sort::{Pagination, SortBy, SortConfig, SortOrder};
