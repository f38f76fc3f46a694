//! Short-window empirical error correction.

use chrono::{DateTime, Duration, Utc};

use super::stats::mean;
use crate::config::PredictionPolicy;
use crate::db::{DatasetSnapshot, SeriesIndex};
use crate::error::{PredictionError, PredictionResult};
use crate::models::{BaseStats, CorrectedPrediction, Measurement, SeriesFilter};

/// Shift the base estimate by how far the last `recent_window_minutes`
/// deviated from it.
///
/// Only departures in `[target - window, target)` that match the base
/// estimate's stop/direction filter are used, so nothing at or after the
/// target instant can influence the forecast. With fewer than
/// `min_recent_samples` departures the correction is zero.
pub fn apply_correction(
    snapshot: &DatasetSnapshot,
    base: &BaseStats,
    target: DateTime<Utc>,
    policy: &PredictionPolicy,
) -> PredictionResult<CorrectedPrediction> {
    correct_series(snapshot.delay_series(), base, target, policy)
}

/// [`apply_correction`] over any indexed series.
///
/// Fails with [`PredictionError::InvalidInput`] when the window start is not
/// a representable instant.
pub fn correct_series<M, F>(
    series: &SeriesIndex<M>,
    base: &BaseStats<F>,
    target: DateTime<Utc>,
    policy: &PredictionPolicy,
) -> PredictionResult<CorrectedPrediction<F>>
where
    M: Measurement,
    F: SeriesFilter<M> + Clone,
{
    let window_start = Duration::try_minutes(policy.recent_window_minutes)
        .and_then(|window| target.checked_sub_signed(window))
        .ok_or_else(|| {
            PredictionError::InvalidInput(format!(
                "recent window of {} minutes before {} is out of range",
                policy.recent_window_minutes, target
            ))
        })?;

    let recent: Vec<f64> = series
        .window(window_start, target)
        .iter()
        .filter(|m| base.filter.matches(m))
        .map(|m| m.value())
        .collect();

    let recent_mean = if recent.len() >= policy.min_recent_samples {
        mean(&recent)
    } else {
        None
    };
    let error_correction = recent_mean.map_or(0.0, |m| m - base.base_mean);

    Ok(CorrectedPrediction {
        base: base.clone(),
        recent_sample_size: recent.len(),
        recent_mean,
        error_correction,
        adjusted_mean: base.base_mean + error_correction,
    })
}
