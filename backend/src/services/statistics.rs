//! Descriptive delay statistics for dashboards.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::algorithms::stats::mean;
use crate::db::DatasetSnapshot;
use crate::error::{PredictionError, PredictionResult};
use crate::models::{Observation, StopFilter};

/// Upper bounds (inclusive, seconds) of the distribution buckets; anything
/// above the last bound lands in the overflow bucket.
pub const DELAY_BUCKETS: [(&str, f64); 4] = [
    ("0-60s", 60.0),
    ("60-120s", 120.0),
    ("120-180s", 180.0),
    ("180-300s", 300.0),
];
pub const OVERFLOW_BUCKET: &str = ">300s";

pub const DEFAULT_HISTORY_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicStatistics {
    pub date: NaiveDate,
    pub hour_from: u32,
    pub hour_to: u32,
    pub record_count: usize,
    pub mean_delay: Option<f64>,
    pub max_delay: Option<f64>,
    pub distinct_stops: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayBucket {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyTrendPoint {
    pub date: NaiveDate,
    pub hour: u32,
    pub avg_delay: f64,
    pub count: usize,
}

/// Observations recorded on `date` (UTC).
pub(crate) fn day_slice(snapshot: &DatasetSnapshot, date: NaiveDate) -> &[Observation] {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    let end = date
        .succ_opt()
        .map_or(DateTime::<Utc>::MAX_UTC, |next| next.and_time(chrono::NaiveTime::MIN).and_utc());
    snapshot.window(start, end)
}

fn validate_hours(hour_from: u32, hour_to: u32) -> PredictionResult<()> {
    if hour_from > hour_to || hour_to > 24 {
        return Err(PredictionError::InvalidInput(format!(
            "invalid hour range {}..={}",
            hour_from, hour_to
        )));
    }
    Ok(())
}

fn filter_hours(
    snapshot: &DatasetSnapshot,
    date: NaiveDate,
    hour_from: u32,
    hour_to: u32,
) -> impl Iterator<Item = &Observation> {
    day_slice(snapshot, date)
        .iter()
        .filter(move |o| (hour_from..=hour_to).contains(&o.hour()))
}

/// Mean and max delay plus stop count for `date`, hours `hour_from..=hour_to`.
pub fn basic_statistics(
    snapshot: &DatasetSnapshot,
    date: NaiveDate,
    hour_from: u32,
    hour_to: u32,
) -> PredictionResult<BasicStatistics> {
    validate_hours(hour_from, hour_to)?;

    let rows: Vec<&Observation> = filter_hours(snapshot, date, hour_from, hour_to).collect();
    let delays: Vec<f64> = rows.iter().map(|o| o.delay_seconds).collect();
    let distinct_stops = rows
        .iter()
        .map(|o| o.stop_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    Ok(BasicStatistics {
        date,
        hour_from,
        hour_to,
        record_count: rows.len(),
        mean_delay: mean(&delays),
        max_delay: delays.iter().copied().reduce(f64::max),
        distinct_stops,
    })
}

/// Count delays into the fixed buckets, in bucket order.
///
/// Early departures (negative delays) fall into the first bucket.
pub fn bucket_delays(delays: impl IntoIterator<Item = f64>) -> Vec<DelayBucket> {
    let mut counts = [0usize; DELAY_BUCKETS.len() + 1];
    for delay in delays {
        let idx = DELAY_BUCKETS
            .iter()
            .position(|(_, upper)| delay <= *upper)
            .unwrap_or(DELAY_BUCKETS.len());
        counts[idx] += 1;
    }

    DELAY_BUCKETS
        .iter()
        .map(|(label, _)| *label)
        .chain(std::iter::once(OVERFLOW_BUCKET))
        .zip(counts)
        .map(|(label, count)| DelayBucket {
            label: label.to_string(),
            count,
        })
        .collect()
}

pub fn delay_distribution(
    snapshot: &DatasetSnapshot,
    date: NaiveDate,
    hour_from: u32,
    hour_to: u32,
) -> PredictionResult<Vec<DelayBucket>> {
    validate_hours(hour_from, hour_to)?;
    Ok(bucket_delays(
        filter_hours(snapshot, date, hour_from, hour_to).map(|o| o.delay_seconds),
    ))
}

fn hourly_means(snapshot: &DatasetSnapshot, date: NaiveDate) -> Vec<HourlyTrendPoint> {
    let mut by_hour: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for obs in day_slice(snapshot, date) {
        by_hour.entry(obs.hour()).or_default().push(obs.delay_seconds);
    }
    by_hour
        .into_iter()
        .filter_map(|(hour, delays)| {
            Some(HourlyTrendPoint {
                date,
                hour,
                avg_delay: mean(&delays)?,
                count: delays.len(),
            })
        })
        .collect()
}

/// Average delay per hour of `date`, followed by `compare_date` if given.
/// Hours without departures are absent.
pub fn hourly_trends(
    snapshot: &DatasetSnapshot,
    date: NaiveDate,
    compare_date: Option<NaiveDate>,
) -> Vec<HourlyTrendPoint> {
    let mut points = hourly_means(snapshot, date);
    if let Some(other) = compare_date {
        points.extend(hourly_means(snapshot, other));
    }
    points
}

/// `until - days`, rejecting non-positive spans and instants outside the
/// representable range.
pub(crate) fn trailing_start(until: DateTime<Utc>, days: i64) -> PredictionResult<DateTime<Utc>> {
    if days <= 0 {
        return Err(PredictionError::InvalidInput(format!(
            "days must be positive, got {}",
            days
        )));
    }
    Duration::try_days(days)
        .and_then(|span| until.checked_sub_signed(span))
        .ok_or_else(|| PredictionError::InvalidInput(format!("{} days before {} is out of range", days, until)))
}

/// Departures matching `filter` in `[until - days, until)`, oldest first.
pub fn recent_history(
    snapshot: &DatasetSnapshot,
    filter: &StopFilter,
    until: DateTime<Utc>,
    days: i64,
) -> PredictionResult<Vec<Observation>> {
    let since = trailing_start(until, days)?;
    Ok(snapshot
        .window(since, until)
        .iter()
        .filter(|o| filter.matches(o))
        .cloned()
        .collect())
}
