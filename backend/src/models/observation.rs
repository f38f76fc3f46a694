use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::series::{Measurement, SeriesFilter};
use super::time::{hour_of_day, weekday_index};

/// One realized departure event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub stop_id: String,
    /// Route direction (GTFS `direction_id`), absent for some feeds.
    #[serde(default)]
    pub direction: Option<i32>,
    pub departure_timestamp: DateTime<Utc>,
    /// Signed delay; negative means the vehicle left early.
    pub delay_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_name: Option<String>,
}

impl Observation {
    pub fn new(
        stop_id: impl Into<String>,
        direction: Option<i32>,
        departure_timestamp: DateTime<Utc>,
        delay_seconds: f64,
    ) -> Self {
        Self {
            stop_id: stop_id.into(),
            direction,
            departure_timestamp,
            delay_seconds,
            route: None,
            trip_id: None,
            stop_sequence: None,
            stop_name: None,
        }
    }

    /// Attach the trip this departure belongs to.
    pub fn with_trip(mut self, trip_id: impl Into<String>, stop_sequence: u32) -> Self {
        self.trip_id = Some(trip_id.into());
        self.stop_sequence = Some(stop_sequence);
        self
    }

    pub fn with_stop_name(mut self, name: impl Into<String>) -> Self {
        self.stop_name = Some(name.into());
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn hour(&self) -> u32 {
        hour_of_day(&self.departure_timestamp)
    }

    pub fn weekday(&self) -> u32 {
        weekday_index(&self.departure_timestamp)
    }
}

impl Measurement for Observation {
    fn measured_at(&self) -> DateTime<Utc> {
        self.departure_timestamp
    }

    fn value(&self) -> f64 {
        self.delay_seconds
    }
}

/// Optional stop and direction constraints applied to observations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StopFilter {
    pub stop_id: Option<String>,
    pub direction: Option<i32>,
}

impl StopFilter {
    pub fn new(stop_id: Option<String>, direction: Option<i32>) -> Self {
        Self { stop_id, direction }
    }

    /// No constraint at all: every observation matches.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn matches(&self, obs: &Observation) -> bool {
        let stop_ok = self
            .stop_id
            .as_deref()
            .map_or(true, |stop| obs.stop_id == stop);
        let direction_ok = self
            .direction
            .map_or(true, |direction| obs.direction == Some(direction));
        stop_ok && direction_ok
    }

    pub fn is_unconstrained(&self) -> bool {
        self.stop_id.is_none() && self.direction.is_none()
    }
}

impl SeriesFilter<Observation> for StopFilter {
    fn matches(&self, sample: &Observation) -> bool {
        StopFilter::matches(self, sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn obs(stop: &str, direction: Option<i32>) -> Observation {
        Observation::new(
            stop,
            direction,
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap(),
            42.0,
        )
    }

    #[test]
    fn test_derived_calendar_fields() {
        let o = obs("U100", Some(0));
        assert_eq!(o.hour(), 8);
        assert_eq!(o.weekday(), 0);
    }

    #[test]
    fn test_unconstrained_filter_matches_everything() {
        let filter = StopFilter::any();
        assert!(filter.is_unconstrained());
        assert!(filter.matches(&obs("U100", None)));
        assert!(filter.matches(&obs("U200", Some(1))));
    }

    #[test]
    fn test_direction_filter_rejects_missing_direction() {
        let filter = StopFilter::new(None, Some(1));
        assert!(filter.matches(&obs("U100", Some(1))));
        assert!(!filter.matches(&obs("U100", Some(0))));
        assert!(!filter.matches(&obs("U100", None)));
    }

    #[test]
    fn test_stop_and_direction_filter() {
        let filter = StopFilter::new(Some("U100".into()), Some(0));
        assert!(filter.matches(&obs("U100", Some(0))));
        assert!(!filter.matches(&obs("U101", Some(0))));
    }

    #[test]
    fn test_optional_fields_default_when_missing() {
        let json = r#"{
            "stop_id": "U1",
            "departure_timestamp": "2024-01-01T08:00:00Z",
            "delay_seconds": -12.5
        }"#;
        let o: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(o.direction, None);
        assert_eq!(o.trip_id, None);
        assert_eq!(o.delay_seconds, -12.5);
    }
}
