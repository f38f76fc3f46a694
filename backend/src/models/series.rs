//! What the forecasting algorithms need from a measured quantity.
//!
//! Stop delays and segment travel times are both timestamped scalars
//! bucketed by weekday and hour; the estimator and the correction step are
//! written once against these traits.

use chrono::{DateTime, Utc};

use super::time::{hour_of_day, weekday_index};

/// A timestamped scalar sample.
pub trait Measurement {
    fn measured_at(&self) -> DateTime<Utc>;

    /// Seconds: a signed delay or a travel time, depending on the series.
    fn value(&self) -> f64;

    fn hour(&self) -> u32 {
        hour_of_day(&self.measured_at())
    }

    fn weekday(&self) -> u32 {
        weekday_index(&self.measured_at())
    }
}

/// Selects the comparable samples of a series.
pub trait SeriesFilter<M> {
    fn matches(&self, sample: &M) -> bool;
}
