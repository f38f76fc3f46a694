use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A scheduled match or event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOccurrence {
    pub event_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_home: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<String>,
}

impl EventOccurrence {
    pub fn new(event_timestamp: DateTime<Utc>) -> Self {
        Self {
            event_timestamp,
            is_home: None,
            opponent: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.event_timestamp.date_naive()
    }
}

/// Days around an event date that still count as "event day".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWindow {
    pub days_before: u32,
    pub days_after: u32,
}

impl EventWindow {
    pub fn new(days_before: u32, days_after: u32) -> Self {
        Self {
            days_before,
            days_after,
        }
    }
}

/// Set of event dates used to flag target timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCalendar {
    dates: BTreeSet<NaiveDate>,
    window: EventWindow,
}

impl EventCalendar {
    pub fn new(events: &[EventOccurrence], window: EventWindow) -> Self {
        Self {
            dates: events.iter().map(EventOccurrence::date).collect(),
            window,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.dates.iter()
    }

    /// Exact membership, ignoring the window.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Whether `date` lies within `[event - days_before, event + days_after]`
    /// of some event.
    pub fn is_event_date(&self, date: NaiveDate) -> bool {
        // An event at E covers `date` iff E lies in [date - after, date + before].
        let lo = date
            .checked_sub_days(Days::new(self.window.days_after as u64))
            .unwrap_or(NaiveDate::MIN);
        let hi = date
            .checked_add_days(Days::new(self.window.days_before as u64))
            .unwrap_or(NaiveDate::MAX);
        self.dates.range(lo..=hi).next().is_some()
    }

    pub fn is_event_day(&self, dt: &DateTime<Utc>) -> bool {
        self.is_event_date(dt.date_naive())
    }
}
