//! The bucket tree returned by a store client.
//!
//! Intermediate only: the result decoder consumes it bottom-up and it is
//! dropped with the evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response to one [`super::SearchQuery`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Documents matching the filter, regardless of pagination.
    pub total_hits: u64,
    /// Raw row projections; empty for aggregation-only queries.
    #[serde(default)]
    pub rows: Vec<Value>,
    #[serde(default)]
    pub aggregations: AggregationResults,
}

/// Named sibling aggregation results.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct AggregationResults(pub BTreeMap<String, AggregationResult>);

impl AggregationResults {
    pub fn get(&self, name: &str) -> Option<&AggregationResult> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: String, result: AggregationResult) {
        self.0.insert(name, result);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The bucket list under `name`, if that aggregation produced buckets.
    pub fn buckets(&self, name: &str) -> Option<&[Bucket]> {
        match self.get(name) {
            Some(AggregationResult::Buckets(b)) => Some(b),
            _ => None,
        }
    }

    /// The single bucket under `name` (filter/nested aggregations).
    pub fn single(&self, name: &str) -> Option<&SingleBucket> {
        match self.get(name) {
            Some(AggregationResult::Single(s)) => Some(s),
            _ => None,
        }
    }

    /// The metric value under `name`. Outer `None` means the aggregation
    /// is absent; inner `None` means it saw no documents.
    pub fn metric(&self, name: &str) -> Option<Option<f64>> {
        match self.get(name) {
            Some(AggregationResult::Metric(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Result of one named aggregation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum AggregationResult {
    /// Terms / histogram / date-histogram / filters buckets.
    Buckets(Vec<Bucket>),
    /// Filter / nested single bucket.
    Single(SingleBucket),
    /// Leaf metric. `None` when the bucket had no matching documents -
    /// callers must distinguish "no data" from "value 0".
    Metric(Option<f64>),
}

/// One bucket of a multi-bucket aggregation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub key: Value,
    pub doc_count: u64,
    #[serde(default)]
    pub aggregations: AggregationResults,
}

impl Bucket {
    /// Canonical string rendering of the bucket key.
    pub fn key_string(&self) -> String {
        key_string(&self.key)
    }
}

/// Canonical string rendering of a bucket key value. Whole numbers drop
/// their fractional part so numeric keys stay parseable and stable.
pub fn key_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            Some(f) => format!("{f}"),
            None => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// The single bucket of a filter or nested aggregation.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleBucket {
    pub doc_count: u64,
    #[serde(default)]
    pub aggregations: AggregationResults,
}
