//! Calendar arithmetic shared by query assembly and store clients.
//!
//! Date-histogram buckets are truncated to unit boundaries in the
//! caller's timezone; bucket keys are RFC 3339 with millisecond
//! precision so they order chronologically within one timezone.

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat,
    TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

use crate::model::DateUnit;

/// Parses an RFC 3339 date field value.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Epoch milliseconds of a parsed date field value.
pub fn parse_date_millis(s: &str) -> Option<f64> {
    parse_date(s).map(|d| d.timestamp_millis() as f64)
}

/// Formats a bucket boundary as its canonical key.
pub fn format_key(dt: DateTime<Tz>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// Truncates `dt` down to the start of its `unit` interval, evaluated in
/// the timezone `dt` carries.
pub fn truncate(dt: DateTime<Tz>, unit: DateUnit) -> DateTime<Tz> {
    let local = dt.naive_local();
    let date = local.date();
    let truncated = match unit {
        DateUnit::Minute => with_time(
            date,
            NaiveTime::from_hms_opt(local.hour(), local.minute(), 0),
        ),
        DateUnit::Hour => with_time(date, NaiveTime::from_hms_opt(local.hour(), 0, 0)),
        DateUnit::Day => midnight(date),
        DateUnit::Week => {
            let monday =
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
            midnight(monday)
        }
        DateUnit::Month => midnight_opt(NaiveDate::from_ymd_opt(date.year(), date.month(), 1)),
        DateUnit::Year => midnight_opt(NaiveDate::from_ymd_opt(date.year(), 1, 1)),
    };
    match truncated {
        Some(naive) => resolve_local(dt.timezone(), naive).unwrap_or(dt),
        None => dt,
    }
}

/// The start of the interval following `dt` (assumed to be a truncated
/// boundary). Month and year steps are calendar-exact; the sub-month
/// steps are absolute durations.
pub fn advance(dt: DateTime<Tz>, unit: DateUnit) -> DateTime<Tz> {
    match unit {
        DateUnit::Year => dt.checked_add_months(Months::new(12)).unwrap_or(dt),
        DateUnit::Month => dt.checked_add_months(Months::new(1)).unwrap_or(dt),
        DateUnit::Week => dt + Duration::weeks(1),
        DateUnit::Day => dt + Duration::days(1),
        DateUnit::Hour => dt + Duration::hours(1),
        DateUnit::Minute => dt + Duration::minutes(1),
    }
}

/// Converts epoch milliseconds into the given timezone.
pub fn from_millis(millis: f64, tz: Tz) -> Option<DateTime<Tz>> {
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .map(|d| d.with_timezone(&tz))
}

fn midnight(date: NaiveDate) -> Option<NaiveDateTime> {
    with_time(date, NaiveTime::from_hms_opt(0, 0, 0))
}

fn midnight_opt(date: Option<NaiveDate>) -> Option<NaiveDateTime> {
    date.and_then(midnight)
}

fn with_time(date: NaiveDate, time: Option<NaiveTime>) -> Option<NaiveDateTime> {
    time.map(|t| date.and_time(t))
}

/// Resolves a local wall-clock time in `tz`. Ambiguous times (DST
/// fold) take the earlier instant; skipped times fall back to UTC
/// interpretation.
fn resolve_local(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| Some(tz.from_utc_datetime(&naive)))
}
