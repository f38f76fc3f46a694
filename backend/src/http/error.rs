//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::error::PredictionError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Not enough history to forecast
    InsufficientData { found: usize, required: usize },
    /// Internal server error
    Internal(String),
    /// Repository error
    Repository(RepositoryError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Repository(RepositoryError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Repository(RepositoryError::ReadOnly { .. }) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::NotFound(msg) => ApiError::new("NOT_FOUND", msg),
            AppError::BadRequest(msg) => ApiError::new("BAD_REQUEST", msg),
            AppError::InsufficientData { found, required } => ApiError::new(
                "INSUFFICIENT_DATA",
                "Not enough historical data for a prediction",
            )
            .with_details(format!("found {} comparable departures, need {}", found, required)),
            AppError::Internal(msg) => ApiError::new("INTERNAL_ERROR", msg),
            AppError::Repository(e) => {
                let code = match e {
                    RepositoryError::NotFound { .. } => "NOT_FOUND",
                    RepositoryError::ReadOnly { .. } => "READ_ONLY",
                    _ => "REPOSITORY_ERROR",
                };
                ApiError::new(code, e.to_string()).with_details(e.context().to_string())
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<PredictionError> for AppError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::InsufficientData { found, required } => {
                AppError::InsufficientData { found, required }
            }
            PredictionError::InvalidInput(msg) => AppError::BadRequest(msg),
            PredictionError::Statistics(msg) => AppError::Internal(msg),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let insufficient: AppError = PredictionError::InsufficientData { found: 2, required: 5 }.into();
        assert_eq!(insufficient.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let invalid: AppError = PredictionError::InvalidInput("bad".into()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let repo: AppError = RepositoryError::internal("boom").into();
        assert_eq!(repo.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let read_only: AppError = RepositoryError::read_only("nope").into();
        assert_eq!(read_only.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_error_body_shape() {
        let body = ApiError::new("BAD_REQUEST", "oops");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "BAD_REQUEST");
        assert!(json.get("details").is_none());
    }
}
