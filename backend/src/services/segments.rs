//! Travel-time forecasts between consecutive stops.
//!
//! Same pipeline as stop delays: base estimate from the same weekday and
//! hour, trailing-window correction, reliability score. Only the measured
//! series differs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::forecast::{conditions_at, offset_minutes, run_steps, step_targets};
use super::statistics::trailing_start;
use crate::algorithms::reliability;
use crate::algorithms::{correct_series, estimate_series};
use crate::config::{ForecastSettings, PredictionPolicy};
use crate::db::DatasetSnapshot;
use crate::error::{PredictionError, PredictionResult};
use crate::models::{
    day_name, hour_of_day, is_weekend, SegmentFilter, SegmentForecast, SegmentPrediction, SegmentTraversal,
    SeriesFilter, TimePeriod,
};

/// Traversal count and mean travel time of one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub segment_id: String,
    pub traversals: usize,
    pub mean_travel_time: f64,
}

/// Every segment in the snapshot, ordered by id.
pub fn list_segments(snapshot: &DatasetSnapshot) -> Vec<SegmentSummary> {
    let mut totals: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for seg in snapshot.segment_series().samples() {
        let entry = totals.entry(seg.segment_id.as_str()).or_default();
        entry.0 += 1;
        entry.1 += seg.travel_time_seconds;
    }
    totals
        .into_iter()
        .map(|(id, (count, sum))| SegmentSummary {
            segment_id: id.to_string(),
            traversals: count,
            mean_travel_time: sum / count as f64,
        })
        .collect()
}

/// Forecast the travel time of a segment at `target`.
///
/// Fails with [`PredictionError::InsufficientData`] when the segment has too
/// few traversals in the target's weekday and hour. Filters are never
/// relaxed: a segment forecast without its segment id means nothing.
pub fn predict_segment(
    snapshot: &DatasetSnapshot,
    target: DateTime<Utc>,
    filter: &SegmentFilter,
    policy: &PredictionPolicy,
) -> PredictionResult<SegmentPrediction> {
    let series = snapshot.segment_series();
    let base = estimate_series(series, target, filter, policy)?;
    let corrected = correct_series(series, &base, target, policy)?;

    let conditions = conditions_at(snapshot, target);
    let reliability = reliability::score(&corrected.base, corrected.error_correction, conditions, policy);
    let base = corrected.base;

    Ok(SegmentPrediction {
        target_datetime: target,
        segment_id: filter.segment_id.clone(),
        direction: filter.direction,
        base_mean: base.base_mean,
        median_travel_time: base.median_delay,
        std_travel_time: base.std_delay,
        sample_size: base.sample_size,
        recent_sample_size: corrected.recent_sample_size,
        adjusted_mean: corrected.adjusted_mean,
        error_correction: corrected.error_correction,
        margin_of_error: base.margin_of_error,
        confidence_lower: base.confidence_lower,
        confidence_upper: base.confidence_upper,
        reliability,
        is_peak_hour: conditions.is_peak_hour,
        is_event_day: conditions.is_event_day,
        is_weekend: is_weekend(&target),
        day_name: day_name(&target),
        time_period: TimePeriod::from_hour(hour_of_day(&target)),
    })
}

/// Rolling travel-time forecast with the short-term step and horizon.
pub fn generate_segment_short_term(
    snapshot: &DatasetSnapshot,
    start: DateTime<Utc>,
    filter: &SegmentFilter,
    policy: &PredictionPolicy,
    settings: &ForecastSettings,
) -> PredictionResult<SegmentForecast> {
    settings.validate().map_err(PredictionError::InvalidInput)?;

    let end = offset_minutes(start, settings.short_term_horizon_minutes)?;
    let targets = step_targets(start, end, settings.short_term_interval_minutes)?;
    let (records, skipped) = run_steps(&targets, |t| predict_segment(snapshot, t, filter, policy))?;

    log::debug!(
        "segment {} forecast from {}: {} records, {} skipped",
        filter.segment_id,
        start,
        records.len(),
        skipped.len()
    );

    Ok(SegmentForecast {
        segment_id: filter.segment_id.clone(),
        direction: filter.direction,
        records,
        skipped,
    })
}

/// Traversals of the segment completed in `[until - days, until)`, oldest
/// first.
pub fn segment_history(
    snapshot: &DatasetSnapshot,
    filter: &SegmentFilter,
    until: DateTime<Utc>,
    days: i64,
) -> PredictionResult<Vec<SegmentTraversal>> {
    let since = trailing_start(until, days)?;
    Ok(snapshot
        .segment_series()
        .window(since, until)
        .iter()
        .filter(|s| filter.matches(s))
        .cloned()
        .collect())
}
