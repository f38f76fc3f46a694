//! Base estimator: same-hour, same-weekday conditional statistics.

use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::stats::{margin_of_error, mean, median, sample_std};
use crate::config::PredictionPolicy;
use crate::db::{DatasetSnapshot, SeriesIndex};
use crate::error::{PredictionError, PredictionResult};
use crate::models::{hour_of_day, weekday_index, BaseStats, Measurement, SeriesFilter, StopFilter};

/// Estimate the delay at `target` from historically comparable departures.
///
/// Comparable means recorded at the same hour of day on the same weekday,
/// restricted to `filter`. Fails with [`PredictionError::InsufficientData`]
/// when fewer than `policy.min_base_samples` rows qualify; relaxing the
/// filter is left to the caller.
pub fn estimate_base(
    snapshot: &DatasetSnapshot,
    target: DateTime<Utc>,
    filter: &StopFilter,
    policy: &PredictionPolicy,
) -> PredictionResult<BaseStats> {
    estimate_series(snapshot.delay_series(), target, filter, policy)
}

/// [`estimate_base`] over any indexed series, e.g. segment travel times.
pub fn estimate_series<M, F>(
    series: &SeriesIndex<M>,
    target: DateTime<Utc>,
    filter: &F,
    policy: &PredictionPolicy,
) -> PredictionResult<BaseStats<F>>
where
    M: Measurement,
    F: SeriesFilter<M> + Clone + Debug,
{
    let target_hour = hour_of_day(&target);
    let target_weekday = weekday_index(&target);

    let values: Vec<f64> = series
        .slot(target_weekday, target_hour)
        .filter(|m| filter.matches(m))
        .map(|m| m.value())
        .collect();

    log::debug!(
        "estimate_series target={} weekday={} hour={} filter={:?} samples={}",
        target,
        target_weekday,
        target_hour,
        filter,
        values.len()
    );

    if values.len() < policy.min_base_samples {
        return Err(PredictionError::InsufficientData {
            found: values.len(),
            required: policy.min_base_samples,
        });
    }

    let sample_size = values.len();
    let base_mean = mean(&values).unwrap_or(0.0);
    let std_delay = sample_std(&values);
    let margin = margin_of_error(std_delay, sample_size, policy.confidence_level)?;

    Ok(BaseStats {
        filter: filter.clone(),
        target_hour,
        target_weekday,
        base_mean,
        median_delay: median(&values).unwrap_or(base_mean),
        std_delay,
        sample_size,
        margin_of_error: margin,
        confidence_lower: base_mean - margin,
        confidence_upper: base_mean + margin,
    })
}
