//! Forecasting algorithms.
//!
//! - [`estimator`]: same-hour/same-weekday base statistics, for stop delays
//!   or any other indexed series
//! - [`correction`]: trailing-window error correction
//! - [`reliability`]: 0–100 trust score
//! - [`stats`]: shared numerical helpers

pub mod correction;
pub mod estimator;
pub mod reliability;
pub mod stats;

pub use correction::{apply_correction, correct_series};
pub use estimator::{estimate_base, estimate_series};
pub use reliability::{Conditions, ReliabilityBreakdown};
pub use stats::{DelaySummary, WelchTest};
