// src/model/filter.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Abstract report filters.
///
/// The engine never interprets these directly; the filter enhancer turns
/// them into a store-native filter expression once per evaluation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Filter {
    /// Instance started within the (half-open) range.
    StartDate {
        #[serde(default)]
        after: Option<DateTime<Utc>>,
        #[serde(default)]
        before: Option<DateTime<Utc>>,
    },
    /// Instance ended within the (half-open) range.
    EndDate {
        #[serde(default)]
        after: Option<DateTime<Utc>>,
        #[serde(default)]
        before: Option<DateTime<Utc>>,
    },
    /// Variable equals the given value.
    VariableEquals { name: String, value: Value },
    /// Numeric variable comparison.
    VariableCompare {
        name: String,
        op: CompareOp,
        value: f64,
    },
    /// Instance executed the given flow node.
    FlowNodeExecuted { flow_node_id: String },
    /// Instance is in the given state.
    InstanceState { state: InstanceState },
    /// Instance duration comparison, in milliseconds.
    DurationCompare { op: CompareOp, value_ms: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InstanceState {
    Running,
    Completed,
    Canceled,
}
