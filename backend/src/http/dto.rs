//! Data Transfer Objects for the HTTP API.
//!
//! Engine and analytics types already derive Serialize and are re-exported
//! here; this module adds query parameters and response envelopes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::models::{
    ForecastBatch, Observation, PredictionRecord, SegmentForecast, SegmentPrediction, SegmentTraversal,
};
pub use crate::services::{
    BasicStatistics, ComparisonWindow, DelayBucket, EventImpact, HourlyTrendPoint, NextStop, SegmentSummary,
};

/// Query parameters shared by the prediction endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PredictionQuery {
    /// Target (single prediction) or start (batches); defaults to now
    #[serde(default, alias = "start")]
    pub at: Option<String>,
    #[serde(default)]
    pub stop_id: Option<String>,
    #[serde(default)]
    pub direction: Option<i32>,
}

/// Query parameters for the weekly forecast.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeeklyQuery {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub stop_id: Option<String>,
    #[serde(default)]
    pub direction: Option<i32>,
    /// Step size (default: `forecast.weekly_interval_minutes`)
    #[serde(default)]
    pub interval_minutes: Option<i64>,
    /// Records below this reliability are dropped (default: 0)
    #[serde(default)]
    pub min_reliability: Option<f64>,
}

/// Query parameters for the statistics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsQuery {
    pub date: String,
    #[serde(default)]
    pub hour_from: Option<u32>,
    #[serde(default)]
    pub hour_to: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub statistics: BasicStatistics,
    pub distribution: Vec<DelayBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyQuery {
    pub date: String,
    #[serde(default)]
    pub compare_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyTrendsResponse {
    pub points: Vec<HourlyTrendPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NextStopQuery {
    #[serde(default)]
    pub direction: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextStopResponse {
    pub stop_id: String,
    pub next: Option<NextStop>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HistoryQuery {
    /// End of the history window (exclusive); defaults to now
    #[serde(default)]
    pub until: Option<String>,
    #[serde(default)]
    pub direction: Option<i32>,
    #[serde(default)]
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub stop_id: String,
    pub count: usize,
    pub observations: Vec<Observation>,
}

/// Query parameters for segment forecasts.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SegmentQuery {
    /// Target (single prediction) or start (short-term); defaults to now
    #[serde(default, alias = "start")]
    pub at: Option<String>,
    #[serde(default)]
    pub direction: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentListResponse {
    pub segments: Vec<SegmentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentHistoryResponse {
    pub segment_id: String,
    pub count: usize,
    pub traversals: Vec<SegmentTraversal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventComparisonResponse {
    pub date: NaiveDate,
    pub windows: Vec<ComparisonWindow>,
}

/// Response for data ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Rows stored
    pub stored: usize,
    /// Rows rejected during validation
    pub dropped: usize,
    /// Checksum of the rebuilt snapshot
    pub checksum: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Repository backend and its status
    pub repository: String,
    pub observations: usize,
    pub event_dates: usize,
    pub checksum: String,
}
