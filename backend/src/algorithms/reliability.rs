//! Multi-factor reliability score on a 0–100 scale.

use serde::{Deserialize, Serialize};

use crate::config::PredictionPolicy;
use crate::models::BaseStats;

/// Contextual conditions that make a forecast less trustworthy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    pub is_peak_hour: bool,
    pub is_event_day: bool,
}

/// Individual components of the score, exposed for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityBreakdown {
    pub sample_score: f64,
    pub ci_score: f64,
    pub condition_score: f64,
    pub reliability: f64,
}

/// Evidence volume, saturating at `policy.sample_saturation`.
pub fn sample_score(sample_size: usize, policy: &PredictionPolicy) -> f64 {
    (sample_size as f64 / policy.sample_saturation as f64).min(1.0)
}

/// Interval tightness relative to the magnitude of the forecast mean.
///
/// The `+ 1` in the denominator keeps the ratio bounded for means near zero.
pub fn ci_score(margin_of_error: f64, mean: f64) -> f64 {
    let relative_width = (2.0 * margin_of_error) / (mean.abs() + 1.0);
    1.0 - relative_width.min(1.0)
}

/// Peak-hour and event-day penalties, compounded multiplicatively.
pub fn condition_score(conditions: Conditions, policy: &PredictionPolicy) -> f64 {
    let mut score = 1.0;
    if conditions.is_peak_hour {
        score *= policy.peak_penalty;
    }
    if conditions.is_event_day {
        score *= policy.event_penalty;
    }
    score
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Score components for a base estimate shifted by `error_correction`.
///
/// The interval width is judged against the corrected mean, the value the
/// forecast actually reports.
pub fn score_breakdown<F>(
    base: &BaseStats<F>,
    error_correction: f64,
    conditions: Conditions,
    policy: &PredictionPolicy,
) -> ReliabilityBreakdown {
    let sample = sample_score(base.sample_size, policy);
    let ci = ci_score(base.margin_of_error, base.base_mean + error_correction);
    let condition = condition_score(conditions, policy);
    let raw = 100.0
        * (policy.sample_weight * sample + policy.ci_weight * ci + policy.condition_weight * condition);

    ReliabilityBreakdown {
        sample_score: sample,
        ci_score: ci,
        condition_score: condition,
        reliability: round_one_decimal(raw).clamp(0.0, 100.0),
    }
}

/// Reliability in `[0, 100]`, rounded to one decimal place.
pub fn score<F>(
    base: &BaseStats<F>,
    error_correction: f64,
    conditions: Conditions,
    policy: &PredictionPolicy,
) -> f64 {
    score_breakdown(base, error_correction, conditions, policy).reliability
}
