//! Immutable, timestamp-sorted view of the historical dataset.
//!
//! A [`DatasetSnapshot`] is what every engine call reads. It is cheap to
//! clone (one `Arc`) and never mutated after construction, so any number of
//! threads can compute forecasts against it concurrently.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::checksum::dataset_checksum;
use crate::models::{
    derive_segments, EventCalendar, EventOccurrence, EventWindow, Measurement, Observation, SegmentTraversal,
};

/// Number of (weekday, hour) buckets in the slot index.
pub const SLOTS_PER_WEEK: usize = 7 * 24;

fn slot_index(weekday: u32, hour: u32) -> usize {
    (weekday as usize) * 24 + hour as usize
}

/// Samples of one measured quantity, sorted by time and bucketed by
/// weekday and hour.
#[derive(Debug)]
pub struct SeriesIndex<M> {
    samples: Vec<M>,
    slots: Vec<Vec<usize>>,
}

impl<M: Measurement> SeriesIndex<M> {
    pub fn new(mut samples: Vec<M>) -> Self {
        samples.sort_by_key(|m| m.measured_at());

        let mut slots = vec![Vec::new(); SLOTS_PER_WEEK];
        for (idx, sample) in samples.iter().enumerate() {
            slots[slot_index(sample.weekday(), sample.hour())].push(idx);
        }
        Self { samples, slots }
    }

    /// All samples, ascending by time.
    pub fn samples(&self) -> &[M] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples recorded on the given weekday (Monday = 0) and hour.
    pub fn slot(&self, weekday: u32, hour: u32) -> impl Iterator<Item = &M> + '_ {
        let indices: &[usize] = if weekday < 7 && hour < 24 {
            &self.slots[slot_index(weekday, hour)]
        } else {
            &[]
        };
        indices.iter().map(move |&i| &self.samples[i])
    }

    /// Samples with `start <= time < end`.
    pub fn window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[M] {
        if start >= end {
            return &[];
        }
        let lo = self.samples.partition_point(|m| m.measured_at() < start);
        let hi = self.samples.partition_point(|m| m.measured_at() < end);
        &self.samples[lo..hi]
    }
}

#[derive(Debug)]
struct SnapshotData {
    observations: SeriesIndex<Observation>,
    /// Derived from trip sequences in `observations`.
    segments: SeriesIndex<SegmentTraversal>,
    events: Vec<EventOccurrence>,
    calendar: EventCalendar,
    checksum: String,
}

/// Shared handle to one immutable copy of the dataset.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    inner: Arc<SnapshotData>,
}

impl DatasetSnapshot {
    pub fn new(observations: Vec<Observation>, mut events: Vec<EventOccurrence>, event_window: EventWindow) -> Self {
        events.sort_by_key(|e| e.event_timestamp);

        let observations = SeriesIndex::new(observations);
        let segments = SeriesIndex::new(derive_segments(observations.samples()));
        let calendar = EventCalendar::new(&events, event_window);
        let checksum = dataset_checksum(observations.samples(), &events);

        Self {
            inner: Arc::new(SnapshotData {
                observations,
                segments,
                events,
                calendar,
                checksum,
            }),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), EventWindow::default())
    }

    /// All observations, ascending by departure time.
    pub fn observations(&self) -> &[Observation] {
        self.inner.observations.samples()
    }

    /// Stop delays as an indexed series.
    pub fn delay_series(&self) -> &SeriesIndex<Observation> {
        &self.inner.observations
    }

    /// Segment travel times as an indexed series.
    pub fn segment_series(&self) -> &SeriesIndex<SegmentTraversal> {
        &self.inner.segments
    }

    pub fn events(&self) -> &[EventOccurrence] {
        &self.inner.events
    }

    pub fn calendar(&self) -> &EventCalendar {
        &self.inner.calendar
    }

    pub fn checksum(&self) -> &str {
        &self.inner.checksum
    }

    pub fn len(&self) -> usize {
        self.inner.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.observations.is_empty()
    }

    /// Observations recorded on the given weekday (Monday = 0) and hour.
    pub fn slot(&self, weekday: u32, hour: u32) -> impl Iterator<Item = &Observation> + '_ {
        self.inner.observations.slot(weekday, hour)
    }

    /// Observations with `start <= departure < end`.
    pub fn window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[Observation] {
        self.inner.observations.window(start, end)
    }

    /// First and last departure in the dataset.
    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let obs = self.observations();
        Some((obs.first()?.departure_timestamp, obs.last()?.departure_timestamp))
    }
}

impl Default for DatasetSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
