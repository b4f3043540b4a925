//! Calendar arithmetic for validity times
//!
//! All arithmetic is performed in UTC. Month addition clamps to the last valid day of the
//! target month (January 31st plus one month is the last day of February).

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unit of a validity time offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum TimeUnit {
    Minute,
    Hour,
    Day,
    Month,
}

/// Snaps an instant to a calendar boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum DateModifier {
    /// 00:00:00 of the same day
    StartOfDay,

    /// 23:59:59 of the same day
    EndOfDay,

    /// 00:00:00 of the first day of the month
    StartOfMonth,

    /// 23:59:59 of the last day of the month
    EndOfMonth,
}

/// Adds `interval` units to `instant`, returning `instant` unchanged when the result is not representable.
#[must_use]
pub fn add(instant: DateTime<Utc>, unit: TimeUnit, interval: i64) -> DateTime<Utc> {
    let shifted = match unit {
        TimeUnit::Minute => TimeDelta::try_minutes(interval).and_then(|delta| instant.checked_add_signed(delta)),
        TimeUnit::Hour => TimeDelta::try_hours(interval).and_then(|delta| instant.checked_add_signed(delta)),
        TimeUnit::Day => {
            let days = Days::new(interval.unsigned_abs());
            if interval >= 0 {
                instant.checked_add_days(days)
            } else {
                instant.checked_sub_days(days)
            }
        }
        TimeUnit::Month => u32::try_from(interval.unsigned_abs()).ok().and_then(|months| {
            let months = Months::new(months);
            if interval >= 0 {
                instant.checked_add_months(months)
            } else {
                instant.checked_sub_months(months)
            }
        }),
    };

    shifted.unwrap_or(instant)
}

/// Snaps `instant` to the boundary described by `modifier`.
#[must_use]
pub fn apply_modifier(instant: DateTime<Utc>, modifier: DateModifier) -> DateTime<Utc> {
    let date = instant.date_naive();
    let target = match modifier {
        DateModifier::StartOfDay => Some(date.and_time(NaiveTime::MIN)),
        DateModifier::EndOfDay => end_of_day().map(|time| date.and_time(time)),
        DateModifier::StartOfMonth => date.with_day(1).map(|first| first.and_time(NaiveTime::MIN)),
        DateModifier::EndOfMonth => last_day_of_month(date).zip(end_of_day()).map(|(last, time)| last.and_time(time)),
    };

    target.map_or(instant, |naive| Utc.from_utc_datetime(&naive))
}

/// Returns the earlier of `instant` and `max`.
#[must_use]
pub fn clamp(instant: DateTime<Utc>, max: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match max {
        Some(max) if max < instant => max,
        _ => instant,
    }
}

/// Parses an ISO-8601 instant (`2021-06-01T12:00:00Z`) or a calendar date (`2021-06-01`, midnight UTC).
#[must_use]
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

fn end_of_day() -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(23, 59, 59)
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?.checked_add_months(Months::new(1))?.pred_opt()
}
