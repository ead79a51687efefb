//! In-memory store client.
//!
//! Evaluates the full query vocabulary over a vector of JSON documents:
//! enough to embed the engine without an external store and to drive the
//! integration tests against real aggregation semantics.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde_json::Value;

use crate::model::ColumnSelection;
use crate::query::time;
use crate::query::{
    Aggregation, AggregationResult, AggregationResults, Bucket, FilterExpr, MetricFunction,
    NamedAggregation, SearchQuery, SearchResponse, SingleBucket,
};

use super::{StoreClient, StoreError, StoreResult};

/// A store client backed by an in-process document vector.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Value>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    pub fn insert(&self, document: Value) {
        if let Ok(mut docs) = self.documents.write() {
            docs.push(document);
        }
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn search(&self, query: &SearchQuery) -> StoreResult<SearchResponse> {
        let documents = self
            .documents
            .read()
            .map_err(|_| StoreError::Unavailable("document lock poisoned".into()))?;

        let matched: Vec<&Value> = documents
            .iter()
            .filter(|doc| matches_filter(&query.filter, doc))
            .collect();

        let rows = if query.size > 0 {
            matched
                .iter()
                .skip(query.from)
                .take(query.size)
                .map(|doc| project(doc, &query.columns))
                .collect()
        } else {
            Vec::new()
        };

        Ok(SearchResponse {
            total_hits: matched.len() as u64,
            rows,
            aggregations: eval_aggregations(&query.aggregations, &matched)?,
        })
    }
}

// ============================================================================
// Filters
// ============================================================================

fn matches_filter(filter: &FilterExpr, doc: &Value) -> bool {
    match filter {
        FilterExpr::MatchAll => true,
        FilterExpr::Term { field, value } => term_matches(lookup(doc, field), value),
        FilterExpr::Terms { field, values } => {
            let found = lookup(doc, field);
            values.iter().any(|v| term_matches(found, v))
        }
        FilterExpr::Range {
            field,
            gt,
            gte,
            lt,
            lte,
        } => match lookup(doc, field).and_then(value_as_number) {
            Some(v) => {
                bound(gt).map_or(true, |b| v > b)
                    && bound(gte).map_or(true, |b| v >= b)
                    && bound(lt).map_or(true, |b| v < b)
                    && bound(lte).map_or(true, |b| v <= b)
            }
            None => false,
        },
        FilterExpr::Exists { field } => lookup(doc, field).is_some_and(|v| !v.is_null()),
        FilterExpr::Nested { path, filter } => {
            sub_documents(doc, path).any(|sub| matches_filter(filter, sub))
        }
        FilterExpr::Bool {
            must,
            should,
            must_not,
        } => {
            must.iter().all(|f| matches_filter(f, doc))
                && (should.is_empty() || should.iter().any(|f| matches_filter(f, doc)))
                && !must_not.iter().any(|f| matches_filter(f, doc))
        }
    }
}

fn term_matches(found: Option<&Value>, expected: &Value) -> bool {
    match found {
        None => expected.is_null(),
        Some(Value::Array(items)) => items.iter().any(|item| item == expected),
        Some(v) => v == expected,
    }
}

fn bound(b: &Option<Value>) -> Option<f64> {
    b.as_ref().and_then(value_as_number)
}

// ============================================================================
// Aggregations
// ============================================================================

fn eval_aggregations(
    aggs: &[NamedAggregation],
    docs: &[&Value],
) -> StoreResult<AggregationResults> {
    let mut results = AggregationResults::default();
    for named in aggs {
        results.insert(named.name.clone(), eval_aggregation(named, docs)?);
    }
    Ok(results)
}

fn eval_aggregation(named: &NamedAggregation, docs: &[&Value]) -> StoreResult<AggregationResult> {
    match &named.agg {
        Aggregation::Terms {
            field,
            size,
            missing,
        } => eval_terms(field, *size, missing.as_ref(), &named.sub, docs),
        Aggregation::DateHistogram {
            field,
            unit,
            timezone,
        } => {
            let tz: Tz = timezone
                .parse()
                .map_err(|_| StoreError::InvalidQuery(format!("unknown timezone: {timezone}")))?;
            let mut groups: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
            for &doc in docs {
                let parsed = lookup(doc, field)
                    .and_then(Value::as_str)
                    .and_then(time::parse_date);
                if let Some(date) = parsed {
                    let key = time::format_key(time::truncate(date.with_timezone(&tz), *unit));
                    groups.entry(key).or_default().push(doc);
                }
            }
            bucket_list(groups.into_iter().map(|(k, d)| (Value::String(k), d)), &named.sub)
        }
        Aggregation::Histogram {
            field,
            interval,
            offset,
        } => {
            if *interval <= 0.0 {
                return Err(StoreError::InvalidQuery(format!(
                    "histogram interval must be positive, got {interval}"
                )));
            }
            let mut groups: BTreeMap<i64, Vec<&Value>> = BTreeMap::new();
            for &doc in docs {
                if let Some(v) = lookup(doc, field).and_then(value_as_number) {
                    let idx = ((v - offset) / interval).floor() as i64;
                    groups.entry(idx).or_default().push(doc);
                }
            }
            bucket_list(
                groups
                    .into_iter()
                    .map(|(idx, d)| (number_value(offset + idx as f64 * interval), d)),
                &named.sub,
            )
        }
        Aggregation::Filters { buckets } => {
            let mut out = Vec::with_capacity(buckets.len());
            for fb in buckets {
                let matched: Vec<&Value> = docs
                    .iter()
                    .copied()
                    .filter(|doc| matches_filter(&fb.filter, doc))
                    .collect();
                out.push(Bucket {
                    key: Value::String(fb.key.clone()),
                    doc_count: matched.len() as u64,
                    aggregations: eval_aggregations(&named.sub, &matched)?,
                });
            }
            Ok(AggregationResult::Buckets(out))
        }
        Aggregation::Filter { filter } => {
            let matched: Vec<&Value> = docs
                .iter()
                .copied()
                .filter(|doc| matches_filter(filter, doc))
                .collect();
            Ok(AggregationResult::Single(SingleBucket {
                doc_count: matched.len() as u64,
                aggregations: eval_aggregations(&named.sub, &matched)?,
            }))
        }
        Aggregation::Nested { path } => {
            let subs: Vec<&Value> = docs.iter().flat_map(|doc| sub_documents(doc, path)).collect();
            Ok(AggregationResult::Single(SingleBucket {
                doc_count: subs.len() as u64,
                aggregations: eval_aggregations(&named.sub, &subs)?,
            }))
        }
        Aggregation::Metric { function, field } => {
            let mut values: Vec<f64> = docs
                .iter()
                .filter_map(|doc| lookup(doc, field).and_then(value_as_number))
                .collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            Ok(AggregationResult::Metric(eval_metric(function, &values)))
        }
    }
}

fn eval_terms(
    field: &str,
    size: usize,
    missing: Option<&Value>,
    sub: &[NamedAggregation],
    docs: &[&Value],
) -> StoreResult<AggregationResult> {
    let mut groups: BTreeMap<String, (Value, Vec<&Value>)> = BTreeMap::new();
    for &doc in docs {
        let mut keys: Vec<Value> = Vec::new();
        match lookup(doc, field) {
            Some(Value::Array(items)) if !items.is_empty() => {
                keys.extend(items.iter().cloned());
            }
            Some(v) if !v.is_null() => keys.push(v.clone()),
            // Missing, null, or empty array: surfaced under the missing
            // key when one is configured, skipped otherwise.
            _ => {
                if let Some(m) = missing {
                    keys.push(m.clone());
                }
            }
        }
        for key in keys {
            let entry = groups
                .entry(key_string(&key))
                .or_insert_with(|| (key.clone(), Vec::new()));
            entry.1.push(doc);
        }
    }
    let buckets = groups.into_values().take(size);
    bucket_list(buckets, sub)
}

fn bucket_list<'a>(
    groups: impl Iterator<Item = (Value, Vec<&'a Value>)>,
    sub: &[NamedAggregation],
) -> StoreResult<AggregationResult> {
    let mut out = Vec::new();
    for (key, bucket_docs) in groups {
        out.push(Bucket {
            key,
            doc_count: bucket_docs.len() as u64,
            aggregations: eval_aggregations(sub, &bucket_docs)?,
        });
    }
    Ok(AggregationResult::Buckets(out))
}

fn eval_metric(function: &MetricFunction, sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    match function {
        MetricFunction::Avg => Some(sorted.iter().sum::<f64>() / sorted.len() as f64),
        MetricFunction::Min => sorted.first().copied(),
        MetricFunction::Max => sorted.last().copied(),
        MetricFunction::Sum => Some(sorted.iter().sum()),
        MetricFunction::Percentile { p } => Some(percentile(sorted, *p)),
    }
}

/// Linear-interpolation percentile over an ascending slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

// ============================================================================
// Document access
// ============================================================================

/// Resolves a dotted field path inside a document.
fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn sub_documents<'a>(doc: &'a Value, path: &str) -> impl Iterator<Item = &'a Value> {
    lookup(doc, path)
        .and_then(Value::as_array)
        .map(|a| a.iter())
        .unwrap_or_default()
}

/// A field value as a number: JSON numbers directly, RFC 3339 strings as
/// epoch milliseconds.
fn value_as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => time::parse_date_millis(s),
        _ => None,
    }
}

fn key_string(v: &Value) -> String {
    crate::query::key_string(v)
}

fn number_value(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn project(doc: &Value, columns: &ColumnSelection) -> Value {
    if columns.includes.is_empty() && columns.excludes.is_empty() {
        return doc.clone();
    }
    match doc.as_object() {
        Some(map) => {
            let projected: serde_json::Map<String, Value> = map
                .iter()
                .filter(|(k, _)| {
                    (columns.includes.is_empty() || columns.includes.contains(k))
                        && !columns.excludes.contains(k)
                })
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Value::Object(projected)
        }
        None => doc.clone(),
    }
}
