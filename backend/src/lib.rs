//! # Transit Delay Backend
//!
//! Delay forecasting engine for transit stops.
//!
//! The engine blends historical same-hour/same-weekday statistics with a
//! short-horizon empirical correction and attaches a 0–100 reliability score
//! to every forecast. Two batch modes build on the single-point forecast: a
//! short-term rolling forecast and a full-week pattern forecast. The same
//! pipeline forecasts travel times between consecutive stops.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Observations, events, prediction records and calendar helpers
//! - [`algorithms`]: Base estimator, error correction, reliability score
//! - [`services`]: Forecast generators, segment travel times and descriptive/event analytics
//! - [`db`]: Repository pattern, file loaders and the immutable dataset snapshot
//! - [`config`]: `delay.toml` configuration and policy constants
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! ## Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use transit_delay::config::PredictionPolicy;
//! use transit_delay::db::DatasetSnapshot;
//! use transit_delay::models::{EventWindow, Observation, StopFilter};
//! use transit_delay::services::predict;
//!
//! let monday_8am = Utc.with_ymd_and_hms(2024, 1, 8, 8, 0, 0).unwrap();
//! let history: Vec<Observation> = [10.0, 20.0, 30.0, 40.0, 50.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, d)| Observation::new("U1", Some(0), monday_8am - Duration::weeks(i as i64 + 1), *d))
//!     .collect();
//! let snapshot = DatasetSnapshot::new(history, vec![], EventWindow::default());
//!
//! let record = predict(&snapshot, monday_8am, &StopFilter::any(), &PredictionPolicy::default()).unwrap();
//! assert_eq!(record.base_mean, 30.0);
//! assert_eq!(record.adjusted_mean, 30.0);
//! ```

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod algorithms;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{PredictionError, PredictionResult};
