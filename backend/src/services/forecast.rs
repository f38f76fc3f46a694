//! Single-point predictions and the two batch generators built on them.
//!
//! Every batch step goes through [`predict_with_fallback`], so the
//! configured [`FallbackPolicy`] behaves identically for short-term and
//! weekly forecasts. Steps are independent and evaluated on the rayon pool;
//! the collected batch keeps the ascending order of the step targets.

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;

use crate::algorithms::reliability::{self, Conditions};
use crate::algorithms::{apply_correction, estimate_base};
use crate::config::{FallbackPolicy, ForecastSettings, PredictionPolicy, WEEKLY_SPAN_MINUTES};
use crate::db::DatasetSnapshot;
use crate::error::{PredictionError, PredictionResult};
use crate::models::{
    day_name, floor_to_hour, hour_of_day, is_peak_hour, is_weekend, ForecastBatch, ForecastMode,
    PredictionRecord, StopFilter, TimePeriod,
};

/// Forecast the delay at `target` for the given stop/direction filter.
///
/// Fails with [`PredictionError::InsufficientData`] when the base estimator
/// cannot find enough comparable departures. No fallback is attempted.
pub fn predict(
    snapshot: &DatasetSnapshot,
    target: DateTime<Utc>,
    filter: &StopFilter,
    policy: &PredictionPolicy,
) -> PredictionResult<PredictionRecord> {
    let base = estimate_base(snapshot, target, filter, policy)?;
    let corrected = apply_correction(snapshot, &base, target, policy)?;

    let hour = hour_of_day(&target);
    let conditions = conditions_at(snapshot, target);
    let reliability = reliability::score(&corrected.base, corrected.error_correction, conditions, policy);
    let base = corrected.base;

    Ok(PredictionRecord {
        target_datetime: target,
        stop_id: filter.stop_id.clone(),
        direction: filter.direction,
        base_mean: base.base_mean,
        median_delay: base.median_delay,
        std_delay: base.std_delay,
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
        time_period: TimePeriod::from_hour(hour),
        filters_relaxed: false,
    })
}

/// Peak-hour and event-day classification of `target`.
pub(crate) fn conditions_at(snapshot: &DatasetSnapshot, target: DateTime<Utc>) -> Conditions {
    Conditions {
        is_peak_hour: is_peak_hour(hour_of_day(&target)),
        is_event_day: snapshot.calendar().is_event_day(&target),
    }
}

/// [`predict`], retried once without stop/direction constraints when the
/// policy allows it.
///
/// A relaxed record keeps the requested stop and direction and is flagged
/// with `filters_relaxed`.
pub fn predict_with_fallback(
    snapshot: &DatasetSnapshot,
    target: DateTime<Utc>,
    filter: &StopFilter,
    policy: &PredictionPolicy,
) -> PredictionResult<PredictionRecord> {
    match predict(snapshot, target, filter, policy) {
        Err(err)
            if err.is_insufficient_data()
                && policy.fallback == FallbackPolicy::RelaxFilters
                && !filter.is_unconstrained() =>
        {
            log::warn!(
                "Relaxing filters for {} at {}: {}",
                filter.stop_id.as_deref().unwrap_or("*"),
                target,
                err
            );
            let mut record = predict(snapshot, target, &StopFilter::any(), policy)?;
            record.stop_id = filter.stop_id.clone();
            record.direction = filter.direction;
            record.filters_relaxed = true;
            Ok(record)
        }
        other => other,
    }
}

/// Evaluate `step` for every target in parallel and split the outcomes into
/// records and skipped timestamps, both in target order. Errors other than
/// insufficient data abort the batch.
pub(crate) fn run_steps<R, S>(targets: &[DateTime<Utc>], step: S) -> PredictionResult<(Vec<R>, Vec<DateTime<Utc>>)>
where
    R: Send,
    S: Fn(DateTime<Utc>) -> PredictionResult<R> + Sync,
{
    let outcomes: Vec<(DateTime<Utc>, PredictionResult<R>)> =
        targets.par_iter().map(|&t| (t, step(t))).collect();

    let mut records = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for (target, outcome) in outcomes {
        match outcome {
            Ok(record) => records.push(record),
            Err(err) if err.is_insufficient_data() => skipped.push(target),
            Err(err) => return Err(err),
        }
    }
    Ok((records, skipped))
}

/// Targets `start, start + interval, ...` strictly before `end`, ascending.
pub(crate) fn step_targets(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval_minutes: i64,
) -> PredictionResult<Vec<DateTime<Utc>>> {
    let step = Duration::try_minutes(interval_minutes)
        .filter(|step| *step > Duration::zero())
        .ok_or_else(|| {
            PredictionError::InvalidInput(format!("interval of {} minutes is out of range", interval_minutes))
        })?;

    let mut targets = Vec::new();
    let mut t = start;
    while t < end {
        targets.push(t);
        match t.checked_add_signed(step) {
            Some(next) => t = next,
            None => break,
        }
    }
    Ok(targets)
}

/// `start + minutes`, or [`PredictionError::InvalidInput`] past the
/// representable range.
pub(crate) fn offset_minutes(start: DateTime<Utc>, minutes: i64) -> PredictionResult<DateTime<Utc>> {
    Duration::try_minutes(minutes)
        .and_then(|span| start.checked_add_signed(span))
        .ok_or_else(|| PredictionError::InvalidInput(format!("{} plus {} minutes is out of range", start, minutes)))
}

/// Rolling forecast: one step every `short_term_interval_minutes` over the
/// next `short_term_horizon_minutes`, beginning at `start`.
pub fn generate_short_term(
    snapshot: &DatasetSnapshot,
    start: DateTime<Utc>,
    filter: &StopFilter,
    policy: &PredictionPolicy,
    settings: &ForecastSettings,
) -> PredictionResult<ForecastBatch> {
    settings.validate().map_err(PredictionError::InvalidInput)?;

    let end = offset_minutes(start, settings.short_term_horizon_minutes)?;
    let targets = step_targets(start, end, settings.short_term_interval_minutes)?;
    let (records, skipped) = run_steps(&targets, |t| predict_with_fallback(snapshot, t, filter, policy))?;

    log::debug!(
        "short-term forecast from {}: {} records, {} skipped",
        start,
        records.len(),
        skipped.len()
    );

    Ok(ForecastBatch {
        mode: ForecastMode::ShortTerm,
        stop_id: filter.stop_id.clone(),
        direction: filter.direction,
        records,
        skipped,
    })
}

/// Full-week forecast starting at `start` truncated to the hour.
///
/// Records below `min_reliability` are dropped. They are not listed as
/// skipped; `skipped` only holds steps without enough history.
pub fn generate_weekly(
    snapshot: &DatasetSnapshot,
    start: DateTime<Utc>,
    filter: &StopFilter,
    interval_minutes: i64,
    min_reliability: f64,
    policy: &PredictionPolicy,
) -> PredictionResult<ForecastBatch> {
    if !(1..=WEEKLY_SPAN_MINUTES).contains(&interval_minutes) {
        return Err(PredictionError::InvalidInput(format!(
            "interval_minutes must lie in [1, {}], got {}",
            WEEKLY_SPAN_MINUTES, interval_minutes
        )));
    }
    if !min_reliability.is_finite() {
        return Err(PredictionError::InvalidInput(
            "min_reliability must be a finite number".to_string(),
        ));
    }

    let start = floor_to_hour(&start);
    let end = offset_minutes(start, WEEKLY_SPAN_MINUTES)?;
    let targets = step_targets(start, end, interval_minutes)?;
    let (mut records, skipped) = run_steps(&targets, |t| predict_with_fallback(snapshot, t, filter, policy))?;
    records.retain(|r| r.reliability >= min_reliability);

    log::debug!(
        "weekly forecast from {} every {}min: {} of {} steps kept, {} skipped",
        start,
        interval_minutes,
        records.len(),
        targets.len(),
        skipped.len()
    );

    Ok(ForecastBatch {
        mode: ForecastMode::Weekly,
        stop_id: filter.stop_id.clone(),
        direction: filter.direction,
        records,
        skipped,
    })
}

#[cfg(test)]
#[path = "forecast_tests.rs"]
mod forecast_tests;
