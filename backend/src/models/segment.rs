use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::observation::Observation;
use super::series::{Measurement, SeriesFilter};
use super::time::TimePeriod;

/// Stop ids of one physical platform share the part before the first `Z`
/// (`U100Z1P`, `U100Z2P`); segments are keyed on that stem.
pub fn stop_stem(stop_id: &str) -> &str {
    stop_id.split('Z').next().unwrap_or(stop_id)
}

/// Segment key between two consecutive stops, e.g. `U100_U200`.
pub fn segment_key(from_stop_id: &str, to_stop_id: &str) -> String {
    format!("{}_{}", stop_stem(from_stop_id), stop_stem(to_stop_id))
}

/// One vehicle running between two consecutive stops of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentTraversal {
    pub segment_id: String,
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub trip_id: String,
    pub direction: Option<i32>,
    /// Departure at the downstream stop; hour and weekday come from here.
    pub completed_at: DateTime<Utc>,
    pub travel_time_seconds: f64,
}

impl Measurement for SegmentTraversal {
    fn measured_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    fn value(&self) -> f64 {
        self.travel_time_seconds
    }
}

/// Observations grouped by trip id, each trip ordered by stop sequence.
///
/// Only observations carrying both a trip id and a stop sequence are kept.
pub fn group_trips<'a>(
    observations: impl IntoIterator<Item = &'a Observation>,
) -> BTreeMap<&'a str, Vec<&'a Observation>> {
    let mut trips: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        if let (Some(trip), Some(_)) = (obs.trip_id.as_deref(), obs.stop_sequence) {
            trips.entry(trip).or_default().push(obs);
        }
    }
    for stops in trips.values_mut() {
        stops.sort_by_key(|o| o.stop_sequence);
    }
    trips
}

/// Travel times between consecutive stops of every trip.
///
/// The travel time is the difference of the two realized departures.
/// Pairs whose downstream departure precedes the upstream one are dropped.
pub fn derive_segments(observations: &[Observation]) -> Vec<SegmentTraversal> {
    let mut segments = Vec::new();
    let mut inconsistent = 0usize;

    for (trip_id, stops) in group_trips(observations) {
        for pair in stops.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let elapsed = to.departure_timestamp - from.departure_timestamp;
            if elapsed < chrono::Duration::zero() {
                inconsistent += 1;
                continue;
            }
            segments.push(SegmentTraversal {
                segment_id: segment_key(&from.stop_id, &to.stop_id),
                from_stop_id: from.stop_id.clone(),
                to_stop_id: to.stop_id.clone(),
                trip_id: trip_id.to_string(),
                direction: to.direction,
                completed_at: to.departure_timestamp,
                travel_time_seconds: elapsed.num_milliseconds() as f64 / 1000.0,
            });
        }
    }

    if inconsistent > 0 {
        log::warn!("Dropped {} segment traversals running backwards in time", inconsistent);
    }
    segments
}

/// Segment and optional direction a segment forecast is computed for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentFilter {
    pub segment_id: String,
    pub direction: Option<i32>,
}

impl SegmentFilter {
    pub fn new(segment_id: impl Into<String>, direction: Option<i32>) -> Self {
        Self {
            segment_id: segment_id.into(),
            direction,
        }
    }
}

impl SeriesFilter<SegmentTraversal> for SegmentFilter {
    fn matches(&self, sample: &SegmentTraversal) -> bool {
        sample.segment_id == self.segment_id
            && self
                .direction
                .map_or(true, |direction| sample.direction == Some(direction))
    }
}

/// Travel-time forecast for one segment at one target timestamp.
///
/// Times are in seconds. The interval is centered on the base mean, as for
/// stop delays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPrediction {
    pub target_datetime: DateTime<Utc>,
    pub segment_id: String,
    pub direction: Option<i32>,
    pub base_mean: f64,
    pub median_travel_time: f64,
    pub std_travel_time: f64,
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
}

/// Rolling travel-time forecast for one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentForecast {
    pub segment_id: String,
    pub direction: Option<i32>,
    /// Ascending by `target_datetime`.
    pub records: Vec<SegmentPrediction>,
    pub skipped: Vec<DateTime<Utc>>,
}
