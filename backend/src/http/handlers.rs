//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer. CPU-bound work runs on the blocking pool against the
//! snapshot that was current when the request arrived.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};

use super::dto::{
    EventComparisonResponse, EventImpact, ForecastBatch, HealthResponse, HistoryQuery,
    HistoryResponse, HourlyQuery, HourlyTrendsResponse, IngestResponse, NextStopQuery,
    NextStopResponse, PredictionQuery, PredictionRecord, SegmentForecast, SegmentHistoryResponse,
    SegmentListResponse, SegmentPrediction, SegmentQuery, StatisticsQuery, StatisticsResponse,
    WeeklyQuery,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::loaders::{validate_observations, RawObservation};
use crate::db::services as db_services;
use crate::models::{parse_date, parse_timestamp, EventOccurrence, SegmentFilter, StopFilter};
use crate::services::{self, statistics::DEFAULT_HISTORY_DAYS};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Run a closure on the blocking pool and flatten the join error.
async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
}

/// Parse an optional timestamp parameter, defaulting to now.
fn instant_param(raw: Option<&str>, name: &str) -> Result<DateTime<Utc>, AppError> {
    match raw {
        None => Ok(Utc::now()),
        Some(value) => parse_timestamp(value)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid {} timestamp: '{}'", name, value))),
    }
}

fn date_param(raw: &str, name: &str) -> Result<NaiveDate, AppError> {
    parse_date(raw).ok_or_else(|| AppError::BadRequest(format!("Invalid {} date: '{}'", name, raw)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint reporting repository status and the loaded dataset.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repo_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => format!("{}: connected", state.repository.backend_name()),
        Ok(false) => format!("{}: disconnected", state.repository.backend_name()),
        Err(e) => format!("{}: error: {}", state.repository.backend_name(), e),
    };
    let snapshot = state.snapshot();

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        repository: repo_status,
        observations: snapshot.len(),
        event_dates: snapshot.calendar().len(),
        checksum: snapshot.checksum().to_string(),
    }))
}

// =============================================================================
// Predictions
// =============================================================================

/// GET /v1/predictions
pub async fn get_prediction(
    State(state): State<AppState>,
    Query(query): Query<PredictionQuery>,
) -> HandlerResult<PredictionRecord> {
    let target = instant_param(query.at.as_deref(), "at")?;
    let filter = StopFilter::new(query.stop_id, query.direction);
    let snapshot = state.snapshot();
    let policy = state.policy().clone();

    let record = run_blocking(move || {
        services::predict_with_fallback(&snapshot, target, &filter, &policy).map_err(AppError::from)
    })
    .await?;

    Ok(Json(record))
}

/// GET /v1/predictions/short-term
pub async fn get_short_term(
    State(state): State<AppState>,
    Query(query): Query<PredictionQuery>,
) -> HandlerResult<ForecastBatch> {
    let start = instant_param(query.at.as_deref(), "start")?;
    let filter = StopFilter::new(query.stop_id, query.direction);
    let snapshot = state.snapshot();
    let policy = state.policy().clone();
    let settings = state.forecast_settings().clone();

    let batch = run_blocking(move || {
        services::generate_short_term(&snapshot, start, &filter, &policy, &settings)
            .map_err(AppError::from)
    })
    .await?;

    Ok(Json(batch))
}

/// GET /v1/predictions/weekly
pub async fn get_weekly(
    State(state): State<AppState>,
    Query(query): Query<WeeklyQuery>,
) -> HandlerResult<ForecastBatch> {
    let start = instant_param(query.start.as_deref(), "start")?;
    let filter = StopFilter::new(query.stop_id, query.direction);
    let interval = query
        .interval_minutes
        .unwrap_or(state.forecast_settings().weekly_interval_minutes);
    let min_reliability = query.min_reliability.unwrap_or(0.0);
    let snapshot = state.snapshot();
    let policy = state.policy().clone();

    let batch = run_blocking(move || {
        services::generate_weekly(&snapshot, start, &filter, interval, min_reliability, &policy)
            .map_err(AppError::from)
    })
    .await?;

    Ok(Json(batch))
}

// =============================================================================
// Descriptive statistics
// =============================================================================

/// GET /v1/statistics
pub async fn get_statistics(
    State(state): State<AppState>,
    Query(query): Query<StatisticsQuery>,
) -> HandlerResult<StatisticsResponse> {
    let date = date_param(&query.date, "date")?;
    let hour_from = query.hour_from.unwrap_or(0);
    let hour_to = query.hour_to.unwrap_or(24);
    let snapshot = state.snapshot();

    let response = run_blocking(move || {
        let statistics = services::basic_statistics(&snapshot, date, hour_from, hour_to)?;
        let distribution = services::delay_distribution(&snapshot, date, hour_from, hour_to)?;
        Ok(StatisticsResponse {
            statistics,
            distribution,
        })
    })
    .await?;

    Ok(Json(response))
}

/// GET /v1/statistics/hourly
pub async fn get_hourly_trends(
    State(state): State<AppState>,
    Query(query): Query<HourlyQuery>,
) -> HandlerResult<HourlyTrendsResponse> {
    let date = date_param(&query.date, "date")?;
    let compare = query
        .compare_date
        .as_deref()
        .map(|raw| date_param(raw, "compare_date"))
        .transpose()?;
    let snapshot = state.snapshot();

    let points = run_blocking(move || Ok(services::hourly_trends(&snapshot, date, compare))).await?;

    Ok(Json(HourlyTrendsResponse { points }))
}

// =============================================================================
// Stops
// =============================================================================

/// GET /v1/stops/{stop_id}/next
pub async fn get_next_stop(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
    Query(query): Query<NextStopQuery>,
) -> HandlerResult<NextStopResponse> {
    let snapshot = state.snapshot();
    let id = stop_id.clone();
    let next = run_blocking(move || Ok(services::next_stop(&snapshot, &id, query.direction))).await?;

    Ok(Json(NextStopResponse { stop_id, next }))
}

/// GET /v1/stops/{stop_id}/history
pub async fn get_stop_history(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> HandlerResult<HistoryResponse> {
    let until = instant_param(query.until.as_deref(), "until")?;
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    let filter = StopFilter::new(Some(stop_id.clone()), query.direction);
    let snapshot = state.snapshot();

    let observations = run_blocking(move || {
        services::recent_history(&snapshot, &filter, until, days).map_err(AppError::from)
    })
    .await?;

    Ok(Json(HistoryResponse {
        stop_id,
        count: observations.len(),
        observations,
    }))
}

// =============================================================================
// Segments
// =============================================================================

/// GET /v1/segments
pub async fn list_segments(State(state): State<AppState>) -> HandlerResult<SegmentListResponse> {
    let snapshot = state.snapshot();
    let segments = run_blocking(move || Ok(services::list_segments(&snapshot))).await?;
    Ok(Json(SegmentListResponse { segments }))
}

/// GET /v1/segments/{segment_id}/predictions
pub async fn get_segment_prediction(
    State(state): State<AppState>,
    Path(segment_id): Path<String>,
    Query(query): Query<SegmentQuery>,
) -> HandlerResult<SegmentPrediction> {
    let target = instant_param(query.at.as_deref(), "at")?;
    let filter = SegmentFilter::new(segment_id, query.direction);
    let snapshot = state.snapshot();
    let policy = state.policy().clone();

    let record = run_blocking(move || {
        services::predict_segment(&snapshot, target, &filter, &policy).map_err(AppError::from)
    })
    .await?;

    Ok(Json(record))
}

/// GET /v1/segments/{segment_id}/short-term
pub async fn get_segment_short_term(
    State(state): State<AppState>,
    Path(segment_id): Path<String>,
    Query(query): Query<SegmentQuery>,
) -> HandlerResult<SegmentForecast> {
    let start = instant_param(query.at.as_deref(), "start")?;
    let filter = SegmentFilter::new(segment_id, query.direction);
    let snapshot = state.snapshot();
    let policy = state.policy().clone();
    let settings = state.forecast_settings().clone();

    let forecast = run_blocking(move || {
        services::generate_segment_short_term(&snapshot, start, &filter, &policy, &settings)
            .map_err(AppError::from)
    })
    .await?;

    Ok(Json(forecast))
}

/// GET /v1/segments/{segment_id}/history
pub async fn get_segment_history(
    State(state): State<AppState>,
    Path(segment_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> HandlerResult<SegmentHistoryResponse> {
    let until = instant_param(query.until.as_deref(), "until")?;
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    let filter = SegmentFilter::new(segment_id.clone(), query.direction);
    let snapshot = state.snapshot();

    let traversals = run_blocking(move || {
        services::segment_history(&snapshot, &filter, until, days).map_err(AppError::from)
    })
    .await?;

    Ok(Json(SegmentHistoryResponse {
        segment_id,
        count: traversals.len(),
        traversals,
    }))
}

// =============================================================================
// Event impact
// =============================================================================

/// GET /v1/events/impact
pub async fn get_event_impact(State(state): State<AppState>) -> HandlerResult<EventImpact> {
    let snapshot = state.snapshot();
    let impact = run_blocking(move || Ok(services::analyze_event_impact(&snapshot))).await?;
    Ok(Json(impact))
}

/// GET /v1/events/{date}/comparison
pub async fn get_event_comparison(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> HandlerResult<EventComparisonResponse> {
    let date = date_param(&date, "event")?;
    let snapshot = state.snapshot();
    let windows = run_blocking(move || Ok(services::event_comparison(&snapshot, date))).await?;
    Ok(Json(EventComparisonResponse { date, windows }))
}

// =============================================================================
// Ingestion
// =============================================================================

/// POST /v1/observations
///
/// Replace the stored observations. Invalid rows are dropped and counted.
pub async fn upload_observations(
    State(state): State<AppState>,
    Json(rows): Json<Vec<RawObservation>>,
) -> HandlerResult<IngestResponse> {
    let loaded = validate_observations(rows);
    if loaded.records.is_empty() && loaded.dropped > 0 {
        return Err(AppError::BadRequest(format!(
            "All {} observation rows were invalid",
            loaded.dropped
        )));
    }
    let stored = loaded.records.len();

    let _ingesting = state.lock_ingestion().await;
    let snapshot = db_services::replace_observations(
        state.repository.as_ref(),
        loaded.records,
        state.policy().event_window(),
    )
    .await?;
    let checksum = snapshot.checksum().to_string();
    state.replace_snapshot(snapshot);

    Ok(Json(IngestResponse {
        stored,
        dropped: loaded.dropped,
        checksum,
    }))
}

/// POST /v1/events
pub async fn upload_events(
    State(state): State<AppState>,
    Json(events): Json<Vec<EventOccurrence>>,
) -> HandlerResult<IngestResponse> {
    let stored = events.len();

    let _ingesting = state.lock_ingestion().await;
    let snapshot = db_services::replace_events(
        state.repository.as_ref(),
        events,
        state.policy().event_window(),
    )
    .await?;
    let checksum = snapshot.checksum().to_string();
    state.replace_snapshot(snapshot);

    Ok(Json(IngestResponse {
        stored,
        dropped: 0,
        checksum,
    }))
}
