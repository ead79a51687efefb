// src/model/report.rs
use serde::{Deserialize, Serialize};

use crate::model::filter::Filter;
use crate::model::sort::SortConfig;

/// A report definition: the full description of one analytical report.
///
/// Immutable per evaluation. The engine never persists definitions; it
/// only compiles them into execution plans.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDefinition {
    /// Which class of documents the report runs over.
    pub subject: SubjectType,
    /// Key of the definition the instances belong to.
    pub definition_key: String,
    /// Definition versions to include. Empty means all versions.
    #[serde(default)]
    pub definition_versions: Vec<String>,
    /// Tenants to include. Empty means all tenants; `None` entries select
    /// the default (null) tenant.
    #[serde(default)]
    pub tenant_ids: Vec<Option<String>>,
    /// The metric being measured.
    pub view: ViewConfig,
    /// Primary bucketing dimension.
    pub group_by: GroupByConfig,
    /// Secondary bucketing dimension, nested inside each group-by bucket.
    pub distributed_by: DistributedByConfig,
    /// Abstract filters, translated by the filter enhancer.
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Explicit result sorting. `None` applies the default key sort.
    #[serde(default)]
    pub sorting: Option<SortConfig>,
}

/// The class of documents a report runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubjectType {
    Process,
    Decision,
}

impl SubjectType {
    pub fn id(&self) -> &'static str {
        match self {
            SubjectType::Process => "process",
            SubjectType::Decision => "decision",
        }
    }
}

/// Numeric reducer applied inside duration views.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AggregationType {
    Avg,
    Min,
    Max,
    Sum,
    /// Percentile with `p` in `(0, 100]`.
    Percentile { p: f64 },
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Avg
    }
}

/// Which stretch of a user task a duration view measures.
///
/// Each variant maps to a distinct stored field; none of them is derived
/// by subtraction at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UserTaskDurationVariant {
    /// Creation to completion.
    Total,
    /// Creation to first assignment.
    Idle,
    /// Assignment to completion.
    Work,
}

/// Column include/exclude lists for raw instance listings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnSelection {
    /// Columns to keep. Empty keeps all columns.
    pub includes: Vec<String>,
    /// Columns to drop, applied after `includes`.
    pub excludes: Vec<String>,
}

/// The metric a report measures.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewConfig {
    InstanceFrequency,
    InstanceDuration {
        #[serde(default)]
        aggregation: AggregationType,
    },
    FlowNodeFrequency,
    FlowNodeDuration {
        #[serde(default)]
        aggregation: AggregationType,
    },
    UserTaskFrequency,
    UserTaskDuration {
        #[serde(default)]
        aggregation: AggregationType,
        variant: UserTaskDurationVariant,
    },
    IncidentFrequency,
    IncidentDuration {
        #[serde(default)]
        aggregation: AggregationType,
    },
    /// Raw instance listing: document projection, no aggregation.
    RawInstances {
        #[serde(default)]
        columns: ColumnSelection,
    },
}

/// Which date field of an instance a date dimension buckets on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DateDimension {
    Start,
    End,
    /// Buckets count the instances *active* during each interval, so one
    /// instance may appear in several buckets.
    Running,
}

impl DateDimension {
    pub fn id(&self) -> &'static str {
        match self {
            DateDimension::Start => "startDate",
            DateDimension::End => "endDate",
            DateDimension::Running => "runningDate",
        }
    }
}

/// Fixed calendar units, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DateUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
}

impl DateUnit {
    /// All units, coarsest first.
    pub const ALL: [DateUnit; 6] = [
        DateUnit::Year,
        DateUnit::Month,
        DateUnit::Week,
        DateUnit::Day,
        DateUnit::Hour,
        DateUnit::Minute,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            DateUnit::Year => "year",
            DateUnit::Month => "month",
            DateUnit::Week => "week",
            DateUnit::Day => "day",
            DateUnit::Hour => "hour",
            DateUnit::Minute => "minute",
        }
    }

    /// Approximate unit width in milliseconds, used for bucket-count
    /// estimation only (months and years use calendar averages).
    pub fn approx_millis(&self) -> u64 {
        match self {
            DateUnit::Year => 365 * 24 * 3_600_000,
            DateUnit::Month => 30 * 24 * 3_600_000,
            DateUnit::Week => 7 * 24 * 3_600_000,
            DateUnit::Day => 24 * 3_600_000,
            DateUnit::Hour => 3_600_000,
            DateUnit::Minute => 60_000,
        }
    }
}

/// Bucket width of a date dimension: a fixed unit, or resolved from
/// min/max statistics at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DateUnitConfig {
    Automatic,
    Fixed { unit: DateUnit },
}

impl DateUnitConfig {
    pub fn id(&self) -> &'static str {
        match self {
            DateUnitConfig::Automatic => "automatic",
            DateUnitConfig::Fixed { unit } => unit.id(),
        }
    }
}

/// Declared type of a per-instance variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableType {
    String,
    Boolean,
    Integer,
    Long,
    Double,
    Date,
}

impl VariableType {
    pub fn id(&self) -> &'static str {
        match self {
            VariableType::String => "string",
            VariableType::Boolean => "boolean",
            VariableType::Integer => "integer",
            VariableType::Long => "long",
            VariableType::Double => "double",
            VariableType::Date => "date",
        }
    }

    /// Whether bucket keys of this type compare numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            VariableType::Integer | VariableType::Long | VariableType::Double
        )
    }

    /// Whether numeric range bucketing (rather than terms) applies.
    pub fn is_range_bucketed(&self) -> bool {
        self.is_numeric()
    }
}

/// Identity field of a user task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentityDimension {
    Assignee,
    CandidateGroup,
}

impl IdentityDimension {
    pub fn id(&self) -> &'static str {
        match self {
            IdentityDimension::Assignee => "assignee",
            IdentityDimension::CandidateGroup => "candidateGroup",
        }
    }
}

/// Primary bucketing dimension.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GroupByConfig {
    None,
    Date {
        dimension: DateDimension,
        unit: DateUnitConfig,
    },
    Variable {
        name: String,
        var_type: VariableType,
    },
    FlowNode,
    UserTask,
    Identity {
        dimension: IdentityDimension,
    },
}

/// Secondary bucketing dimension, nested inside each group-by bucket.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DistributedByConfig {
    None,
    Date {
        dimension: DateDimension,
        unit: DateUnitConfig,
    },
    Process,
    FlowNode,
    UserTask,
    Identity {
        dimension: IdentityDimension,
    },
    Variable {
        name: String,
        var_type: VariableType,
    },
}
