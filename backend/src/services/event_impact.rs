//! Event-day versus regular-day delay analysis.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::statistics::day_slice;
use crate::algorithms::stats::{cohens_d, mean, median, sample_std, welch_t_test};
use crate::algorithms::{DelaySummary, WelchTest};
use crate::db::DatasetSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayType {
    #[serde(rename = "Match Days")]
    EventDay,
    #[serde(rename = "Regular Days")]
    RegularDay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyImpact {
    pub day_type: DayType,
    pub hour: u32,
    pub mean_delay: f64,
    pub median_delay: f64,
    pub std_delay: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventImpact {
    pub event_days: DelaySummary,
    pub regular_days: DelaySummary,
    /// Present when both groups hold more than one departure.
    pub welch: Option<WelchTest>,
    /// Cohen's d of event days against regular days.
    pub effect_size: Option<f64>,
    pub hourly: Vec<HourlyImpact>,
}

/// Compare delays on event days (per the snapshot's calendar and window)
/// with all other days.
pub fn analyze_event_impact(snapshot: &DatasetSnapshot) -> EventImpact {
    let calendar = snapshot.calendar();
    let mut event_delays = Vec::new();
    let mut regular_delays = Vec::new();
    let mut by_hour: BTreeMap<(DayType, u32), Vec<f64>> = BTreeMap::new();

    for obs in snapshot.observations() {
        let day_type = if calendar.is_event_day(&obs.departure_timestamp) {
            event_delays.push(obs.delay_seconds);
            DayType::EventDay
        } else {
            regular_delays.push(obs.delay_seconds);
            DayType::RegularDay
        };
        by_hour
            .entry((day_type, obs.hour()))
            .or_default()
            .push(obs.delay_seconds);
    }

    let hourly = by_hour
        .into_iter()
        .map(|((day_type, hour), delays)| HourlyImpact {
            day_type,
            hour,
            mean_delay: mean(&delays).unwrap_or(0.0),
            median_delay: median(&delays).unwrap_or(0.0),
            std_delay: sample_std(&delays),
            count: delays.len(),
        })
        .collect();

    log::debug!(
        "event impact: {} event-day and {} regular-day departures",
        event_delays.len(),
        regular_delays.len()
    );

    EventImpact {
        event_days: DelaySummary::from_values(&event_delays),
        regular_days: DelaySummary::from_values(&regular_delays),
        welch: welch_t_test(&event_delays, &regular_delays),
        effect_size: cohens_d(&event_delays, &regular_delays),
        hourly,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonWindow {
    pub label: String,
    pub date: NaiveDate,
    pub summary: DelaySummary,
}

const COMPARISON_OFFSETS: [(&str, i64); 5] = [
    ("Match Day", 0),
    ("Day Before", -1),
    ("Day After", 1),
    ("Week Before", -7),
    ("Week After", 7),
];

fn shift(date: NaiveDate, offset: i64) -> Option<NaiveDate> {
    let days = Days::new(offset.unsigned_abs());
    if offset < 0 {
        date.checked_sub_days(days)
    } else {
        date.checked_add_days(days)
    }
}

/// Delay summaries for an event date and its neighboring reference days.
pub fn event_comparison(snapshot: &DatasetSnapshot, event_date: NaiveDate) -> Vec<ComparisonWindow> {
    COMPARISON_OFFSETS
        .iter()
        .filter_map(|(label, offset)| {
            let date = shift(event_date, *offset)?;
            let delays: Vec<f64> = day_slice(snapshot, date)
                .iter()
                .map(|o| o.delay_seconds)
                .collect();
            Some(ComparisonWindow {
                label: label.to_string(),
                date,
                summary: DelaySummary::from_values(&delays),
            })
        })
        .collect()
}
