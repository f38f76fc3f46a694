use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::observation::StopFilter;
use super::time::TimePeriod;

/// Historical same-hour/same-weekday statistics for one target.
///
/// `F` is the filter the comparable subset was selected with; for segment
/// travel times the `*_delay` fields hold travel-time statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStats<F = StopFilter> {
    pub filter: F,
    pub target_hour: u32,
    pub target_weekday: u32,
    pub base_mean: f64,
    pub median_delay: f64,
    pub std_delay: f64,
    pub sample_size: usize,
    pub margin_of_error: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
}

/// Base statistics plus the short-window empirical correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedPrediction<F = StopFilter> {
    pub base: BaseStats<F>,
    pub recent_sample_size: usize,
    /// Mean of the trailing window, when it held enough observations.
    pub recent_mean: Option<f64>,
    pub error_correction: f64,
    pub adjusted_mean: f64,
}

/// Engine output for a single target timestamp.
///
/// Field names are the JSON contract read by the dashboard; delays are in
/// seconds and `reliability` is on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub target_datetime: DateTime<Utc>,
    pub stop_id: Option<String>,
    pub direction: Option<i32>,
    pub base_mean: f64,
    pub median_delay: f64,
    pub std_delay: f64,
    pub sample_size: usize,
    pub recent_sample_size: usize,
    pub adjusted_mean: f64,
    pub error_correction: f64,
    pub margin_of_error: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
    pub reliability: f64,
    pub is_peak_hour: bool,
    pub is_event_day: bool,
    pub is_weekend: bool,
    pub day_name: String,
    pub time_period: TimePeriod,
    /// Set when the stop/direction constraints were dropped to find data.
    #[serde(default)]
    pub filters_relaxed: bool,
}

/// Which generator produced a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMode {
    ShortTerm,
    Weekly,
}

/// Ordered sequence of prediction records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBatch {
    pub mode: ForecastMode,
    pub stop_id: Option<String>,
    pub direction: Option<i32>,
    /// Ascending by `target_datetime`.
    pub records: Vec<PredictionRecord>,
    /// Targets with no record because history was insufficient.
    pub skipped: Vec<DateTime<Utc>>,
}

impl ForecastBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.records
            .windows(2)
            .all(|w| w[0].target_datetime <= w[1].target_datetime)
    }
}
