//! Service layer for forecasting and analysis.
//!
//! Services sit between the dataset snapshot and the HTTP layer. They are
//! synchronous and read-only; handlers run them on the blocking pool.

pub mod event_impact;
pub mod forecast;
pub mod network;
pub mod segments;
pub mod statistics;

pub use event_impact::{analyze_event_impact, event_comparison, ComparisonWindow, DayType, EventImpact};
pub use forecast::{generate_short_term, generate_weekly, predict, predict_with_fallback};
pub use network::{next_stop, NextStop};
pub use segments::{
    generate_segment_short_term, list_segments, predict_segment, segment_history, SegmentSummary,
};
pub use statistics::{
    basic_statistics, delay_distribution, hourly_trends, recent_history, BasicStatistics, DelayBucket,
    HourlyTrendPoint,
};
