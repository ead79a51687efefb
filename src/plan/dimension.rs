//! Bucket-aggregation builders shared by the group-by and distributed-by
//! axes. Both axes bucket dates, variables and nested sub-documents the
//! same way; only their nesting position and namespaces differ.

use chrono_tz::Tz;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::model::{
    variable_field, DateDimension, DateUnit, DateUnitConfig, SubjectType, VariableType,
    FIELD_END_DATE, FIELD_EVALUATION_DATE, FIELD_START_DATE,
};
use crate::query::time;
use crate::query::{Aggregation, AggregationResults, FilterBucket, FilterExpr};
use crate::stats::{MinMaxStat, StatsMap};

use super::interval;

/// One decoded dimension bucket: raw key plus the sub-aggregations the
/// next decode level reads from.
#[derive(Debug)]
pub(crate) struct DecodedBucket<'a> {
    pub key: String,
    pub aggregations: &'a AggregationResults,
}

/// Everything the bucketing strategies need during query assembly.
pub(crate) struct AssemblyEnv<'a> {
    pub subject: SubjectType,
    pub timezone: Tz,
    pub stats: &'a StatsMap,
    pub config: &'a EngineConfig,
    /// The nested path of the view, for axes bucketing sub-documents.
    pub view_scope: Option<&'static str>,
}

/// The instance date field backing a date dimension.
pub(crate) fn date_field(subject: SubjectType, dimension: DateDimension) -> &'static str {
    match (subject, dimension) {
        (SubjectType::Decision, _) => FIELD_EVALUATION_DATE,
        (SubjectType::Process, DateDimension::End) => FIELD_END_DATE,
        // Running-date ranges are anchored on the start field.
        (SubjectType::Process, _) => FIELD_START_DATE,
    }
}

/// A date histogram over `field`, resolving automatic units from the
/// field's min/max stats.
pub(crate) fn date_histogram(
    field: &str,
    unit: DateUnitConfig,
    stats: &StatsMap,
    config: &EngineConfig,
    timezone: Tz,
) -> Aggregation {
    let unit = resolve(unit, stats.get(field), config);
    Aggregation::DateHistogram {
        field: field.to_string(),
        unit,
        timezone: timezone.name().to_string(),
    }
}

fn resolve(unit: DateUnitConfig, stat: Option<&Option<MinMaxStat>>, config: &EngineConfig) -> DateUnit {
    match unit {
        DateUnitConfig::Fixed { unit } => unit,
        DateUnitConfig::Automatic => interval::resolve_unit(
            stat.and_then(|s| s.as_ref()),
            config.max_automatic_buckets,
        ),
    }
}

/// Range buckets counting the instances active during each interval.
/// One instance may land in several buckets. Boundaries span the
/// earliest observed start to the latest observed end.
pub(crate) fn running_date_buckets(
    unit: DateUnitConfig,
    stats: &StatsMap,
    config: &EngineConfig,
    timezone: Tz,
) -> Aggregation {
    let start = stats.get(FIELD_START_DATE).and_then(|s| s.as_ref());
    let end = stats.get(FIELD_END_DATE).and_then(|s| s.as_ref());

    let Some(start) = start else {
        return Aggregation::Filters {
            buckets: Vec::new(),
        };
    };
    let span_end = end.map(|e| e.max).unwrap_or(start.max).max(start.max);
    let span = MinMaxStat {
        field: FIELD_START_DATE.to_string(),
        min: start.min,
        max: span_end,
    };

    let unit = match unit {
        DateUnitConfig::Fixed { unit } => unit,
        DateUnitConfig::Automatic => {
            interval::resolve_unit(Some(&span), config.max_automatic_buckets)
        }
    };

    let mut buckets = Vec::new();
    let Some(first) = time::from_millis(span.min, timezone) else {
        return Aggregation::Filters { buckets };
    };
    let mut boundary = time::truncate(first, unit);
    for _ in 0..config.max_automatic_buckets {
        let next = time::advance(boundary, unit);
        let bucket_start = time::format_key(boundary);
        let bucket_end = time::format_key(next);
        buckets.push(FilterBucket {
            key: bucket_start.clone(),
            // Started before the bucket ends, and not finished before it
            // begins (still-running instances have no end date).
            filter: FilterExpr::Bool {
                must: vec![FilterExpr::range(FIELD_START_DATE).lt(bucket_end).build()],
                should: vec![
                    FilterExpr::Bool {
                        must: Vec::new(),
                        should: Vec::new(),
                        must_not: vec![FilterExpr::exists(FIELD_END_DATE)],
                    },
                    FilterExpr::range(FIELD_END_DATE).gte(bucket_start).build(),
                ],
                must_not: Vec::new(),
            },
        });
        if next.timestamp_millis() as f64 > span.max {
            break;
        }
        boundary = next;
    }
    Aggregation::Filters { buckets }
}

/// Bucketing for a per-instance variable: terms for strings and
/// booleans, fixed-width ranges for numerics, a date histogram for
/// dates. Range boundaries come from the variable's min/max stats.
pub(crate) fn variable_aggregation(
    name: &str,
    var_type: VariableType,
    stats: &StatsMap,
    config: &EngineConfig,
    timezone: Tz,
) -> Aggregation {
    let field = variable_field(name);
    match var_type {
        VariableType::Date => date_histogram(
            &field,
            DateUnitConfig::Automatic,
            stats,
            config,
            timezone,
        ),
        VariableType::Integer | VariableType::Long | VariableType::Double => {
            let stat = stats.get(&field).and_then(|s| s.as_ref());
            Aggregation::Histogram {
                field,
                interval: interval::numeric_interval(
                    stat,
                    config.max_automatic_buckets,
                    var_type,
                ),
                offset: stat.map(|s| s.min).unwrap_or(0.0),
            }
        }
        VariableType::String | VariableType::Boolean => Aggregation::Terms {
            field,
            size: config.max_terms_buckets,
            missing: None,
        },
    }
}

/// Stats fields a variable dimension needs before assembly.
pub(crate) fn variable_stats_fields(name: &str, var_type: VariableType) -> Vec<String> {
    if var_type.is_range_bucketed() || var_type == VariableType::Date {
        vec![variable_field(name)]
    } else {
        Vec::new()
    }
}

/// Missing-key marker for identity terms buckets.
pub(crate) fn identity_missing_key() -> Option<Value> {
    Some(Value::String(
        crate::model::MISSING_IDENTITY_KEY.to_string(),
    ))
}
