//! Typed result shapes.
//!
//! Every evaluation produces exactly one of four shapes, tagged with its
//! [`ResultType`] so callers can pattern-match without probing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tag of a decoded result shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultType {
    Number,
    Map,
    HyperMap,
    Raw,
}

impl ResultType {
    pub fn id(&self) -> &'static str {
        match self {
            ResultType::Number => "number",
            ResultType::Map => "map",
            ResultType::HyperMap => "hyperMap",
            ResultType::Raw => "raw",
        }
    }
}

/// One bucket of a map result.
///
/// `key` is the raw bucket key and drives sorting; `label` is only ever
/// presentation and never participates in default ordering.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntry {
    pub key: String,
    pub label: String,
    /// `None` when the bucket had no matching documents, which is
    /// distinct from a measured value of `0`.
    pub value: Option<f64>,
}

impl MapEntry {
    pub fn new(key: impl Into<String>, label: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value,
        }
    }
}

/// One group-by bucket of a two-dimensional result.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HyperMapEntry {
    pub key: String,
    pub label: String,
    pub entries: Vec<MapEntry>,
}

/// Decoded report data.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ReportData {
    Number(Option<f64>),
    Map(Vec<MapEntry>),
    HyperMap(Vec<HyperMapEntry>),
    Raw(Vec<Value>),
}

/// The final evaluation result.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedResult {
    pub data: ReportData,
    /// Instances matching the full filter set.
    pub instance_count: u64,
    /// Instances in definition scope, ignoring report filters.
    pub instance_count_without_filters: u64,
}

impl TypedResult {
    pub fn result_type(&self) -> ResultType {
        match self.data {
            ReportData::Number(_) => ResultType::Number,
            ReportData::Map(_) => ResultType::Map,
            ReportData::HyperMap(_) => ResultType::HyperMap,
            ReportData::Raw(_) => ResultType::Raw,
        }
    }

    /// The scalar value of a number result.
    pub fn as_number(&self) -> Option<f64> {
        match &self.data {
            ReportData::Number(v) => *v,
            _ => None,
        }
    }

    /// The entries of a map result.
    pub fn as_map(&self) -> Option<&[MapEntry]> {
        match &self.data {
            ReportData::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// The entries of a hyper-map result.
    pub fn as_hyper_map(&self) -> Option<&[HyperMapEntry]> {
        match &self.data {
            ReportData::HyperMap(entries) => Some(entries),
            _ => None,
        }
    }

    /// The rows of a raw result.
    pub fn as_raw(&self) -> Option<&[Value]> {
        match &self.data {
            ReportData::Raw(rows) => Some(rows),
            _ => None,
        }
    }
}
