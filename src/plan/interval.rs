//! Automatic interval resolution.
//!
//! Bounded bucket counts with the best resolution that fits: walk units
//! finest to coarsest and take the first whose bucket count over the
//! observed `[min, max]` stays within the cap.

use crate::model::{DateUnit, VariableType};
use crate::stats::MinMaxStat;

/// Fallback when there is no data or the range is degenerate.
const FALLBACK_UNIT: DateUnit = DateUnit::Day;

/// Estimated bucket count for one unit over an epoch-millisecond range.
pub fn estimated_bucket_count(min_ms: f64, max_ms: f64, unit: DateUnit) -> u64 {
    let span = (max_ms - min_ms).max(0.0);
    (span / unit.approx_millis() as f64).floor() as u64 + 1
}

/// The finest unit keeping the bucket count within `cap`; `Year` when
/// even that exceeds the cap, `Day` when no usable stats exist.
pub fn resolve_unit(stat: Option<&MinMaxStat>, cap: u32) -> DateUnit {
    let Some(stat) = stat else {
        return FALLBACK_UNIT;
    };
    if stat.min >= stat.max {
        return FALLBACK_UNIT;
    }
    for unit in DateUnit::ALL.iter().rev() {
        if estimated_bucket_count(stat.min, stat.max, *unit) <= u64::from(cap) {
            return *unit;
        }
    }
    DateUnit::Year
}

/// Histogram interval for a numeric variable so that roughly `cap`
/// buckets cover `[min, max]`. Integer-typed variables round the
/// interval up to whole numbers.
pub fn numeric_interval(stat: Option<&MinMaxStat>, cap: u32, var_type: VariableType) -> f64 {
    let Some(stat) = stat else {
        return 1.0;
    };
    let span = stat.max - stat.min;
    if span <= 0.0 {
        return 1.0;
    }
    let raw = span / f64::from(cap.max(1));
    match var_type {
        VariableType::Integer | VariableType::Long => raw.ceil().max(1.0),
        _ => {
            if raw > 0.0 {
                raw
            } else {
                1.0
            }
        }
    }
}
