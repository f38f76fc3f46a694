//! Calendar helpers shared by the engine and the analytics services.
//!
//! All timestamps in the dataset are normalized to UTC, so hour-of-day and
//! day-of-week are derived from the UTC wall clock.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Half-open hour ranges `[start, end)` that count as peak traffic.
pub const PEAK_HOUR_RANGES: [(u32, u32); 2] = [(7, 10), (16, 19)];

/// Day-of-week index with Monday = 0 .. Sunday = 6.
pub fn weekday_index(dt: &DateTime<Utc>) -> u32 {
    dt.weekday().num_days_from_monday()
}

/// Hour-of-day in `0..24`.
pub fn hour_of_day(dt: &DateTime<Utc>) -> u32 {
    dt.hour()
}

/// Whether the hour falls inside one of the peak windows.
pub fn is_peak_hour(hour: u32) -> bool {
    PEAK_HOUR_RANGES
        .iter()
        .any(|(start, end)| hour >= *start && hour < *end)
}

/// Saturday or Sunday.
pub fn is_weekend(dt: &DateTime<Utc>) -> bool {
    weekday_index(dt) >= 5
}

/// English day name, e.g. "Monday".
pub fn day_name(dt: &DateTime<Utc>) -> String {
    dt.format("%A").to_string()
}

/// Truncate to the start of the hour.
pub fn floor_to_hour(dt: &DateTime<Utc>) -> DateTime<Utc> {
    let naive = dt.date_naive().and_hms_opt(dt.hour(), 0, 0);
    match naive {
        Some(n) => Utc.from_utc_datetime(&n),
        None => *dt,
    }
}

/// Time-of-day classification attached to weekly forecast records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    MorningPeak,
    EveningPeak,
    OffPeak,
}

impl TimePeriod {
    pub fn from_hour(hour: u32) -> Self {
        let [(morning_start, morning_end), (evening_start, evening_end)] = PEAK_HOUR_RANGES;
        if hour >= morning_start && hour < morning_end {
            TimePeriod::MorningPeak
        } else if hour >= evening_start && hour < evening_end {
            TimePeriod::EveningPeak
        } else {
            TimePeriod::OffPeak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimePeriod::MorningPeak => "Morning Peak",
            TimePeriod::EveningPeak => "Evening Peak",
            TimePeriod::OffPeak => "Off-Peak",
        }
    }

    pub fn is_peak(&self) -> bool {
        !matches!(self, TimePeriod::OffPeak)
    }
}

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parse a timestamp as RFC 3339, or as a naive datetime interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse an ISO `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod time_tests;
