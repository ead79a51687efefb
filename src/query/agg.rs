//! Aggregation tree and composite query types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ColumnSelection, DateUnit};

use super::filter::FilterExpr;

/// A named node in the composite aggregation tree.
///
/// Names are generated by the plan's identifier stack and must be unique
/// among siblings; the store echoes them back on the result tree.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedAggregation {
    pub name: String,
    pub agg: Aggregation,
    #[serde(default)]
    pub sub: Vec<NamedAggregation>,
}

impl NamedAggregation {
    pub fn new(name: impl Into<String>, agg: Aggregation, sub: Vec<NamedAggregation>) -> Self {
        Self {
            name: name.into(),
            agg,
            sub,
        }
    }
}

/// The supported aggregation kinds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Aggregation {
    /// One bucket per distinct field value.
    Terms {
        field: String,
        size: usize,
        /// Bucket key for documents missing the field. Absent means such
        /// documents are skipped.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        missing: Option<Value>,
    },

    /// One bucket per calendar interval, truncated in the given timezone.
    DateHistogram {
        field: String,
        unit: DateUnit,
        timezone: String,
    },

    /// Fixed-width numeric buckets anchored at `offset`.
    Histogram {
        field: String,
        interval: f64,
        offset: f64,
    },

    /// One bucket per named filter, in the given order.
    Filters { buckets: Vec<FilterBucket> },

    /// Single bucket of documents matching the filter.
    Filter { filter: FilterExpr },

    /// Single bucket switching the document context to the sub-documents
    /// under `path`.
    Nested { path: String },

    /// Leaf numeric metric.
    Metric { function: MetricFunction, field: String },
}

/// One named bucket of a [`Aggregation::Filters`] aggregation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBucket {
    pub key: String,
    pub filter: FilterExpr,
}

/// Leaf metric functions. Date fields are measured as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MetricFunction {
    Avg,
    Min,
    Max,
    Sum,
    /// Percentile with linear interpolation, `p` in `(0, 100]`.
    Percentile { p: f64 },
}

/// The single composite query the engine sends to the store.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub filter: FilterExpr,
    #[serde(default)]
    pub aggregations: Vec<NamedAggregation>,
    /// Number of raw rows to return; aggregation-only queries use 0.
    #[serde(default)]
    pub size: usize,
    #[serde(default)]
    pub from: usize,
    #[serde(default)]
    pub columns: ColumnSelection,
}

impl SearchQuery {
    /// Aggregation-only query (no raw rows).
    pub fn aggregations(filter: FilterExpr, aggregations: Vec<NamedAggregation>) -> Self {
        Self {
            filter,
            aggregations,
            size: 0,
            from: 0,
            columns: ColumnSelection::default(),
        }
    }

    /// Raw row projection query (no aggregations).
    pub fn rows(filter: FilterExpr, from: usize, size: usize, columns: ColumnSelection) -> Self {
        Self {
            filter,
            aggregations: Vec::new(),
            size,
            from,
            columns,
        }
    }

    /// Pure count query.
    pub fn count(filter: FilterExpr) -> Self {
        Self::aggregations(filter, Vec::new())
    }
}
