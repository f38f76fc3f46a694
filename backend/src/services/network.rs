//! Stop topology derived from trip sequences.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::db::DatasetSnapshot;
use crate::models::group_trips;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStop {
    pub stop_id: String,
    pub stop_name: Option<String>,
    /// Number of trips in which this stop directly followed the requested one.
    pub occurrences: usize,
}

/// Most frequent stop following `stop_id` within trips, optionally limited
/// to one direction. Ties go to the smallest stop id.
///
/// Only observations carrying both a trip id and a stop sequence take part.
pub fn next_stop(snapshot: &DatasetSnapshot, stop_id: &str, direction: Option<i32>) -> Option<NextStop> {
    let trips = group_trips(
        snapshot
            .observations()
            .iter()
            .filter(|o| direction.is_none() || o.direction == direction),
    );

    let mut followers: BTreeMap<&str, usize> = BTreeMap::new();
    for stops in trips.values() {
        for pair in stops.windows(2) {
            if pair[0].stop_id == stop_id && pair[1].stop_id != stop_id {
                *followers.entry(pair[1].stop_id.as_str()).or_default() += 1;
            }
        }
    }

    // BTreeMap iterates in id order; keep the first maximum.
    let (next_id, occurrences) = followers
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (id, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((id, count)),
        })?;

    let stop_name = snapshot
        .observations()
        .iter()
        .filter(|o| o.stop_id == next_id)
        .find_map(|o| o.stop_name.clone());

    log::debug!("next stop after {} ({:?}): {}", stop_id, direction, next_id);

    Some(NextStop {
        stop_id: next_id.to_string(),
        stop_name,
        occurrences,
    })
}
