//! Checksum calculation for dataset snapshots.

use sha2::{Digest, Sha256};

use crate::models::{EventOccurrence, Observation};

/// Calculate SHA-256 checksum of text content.
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Checksum over the engine-relevant columns of both tables.
///
/// Input order matters; snapshots hash their sorted observations so two
/// loads of the same data yield the same value.
pub fn dataset_checksum(observations: &[Observation], events: &[EventOccurrence]) -> String {
    let mut hasher = Sha256::new();
    for obs in observations {
        let direction = obs.direction.map(|d| d.to_string()).unwrap_or_default();
        hasher.update(
            format!(
                "o|{}|{}|{}|{}\n",
                obs.stop_id,
                direction,
                obs.departure_timestamp.timestamp_millis(),
                obs.delay_seconds
            )
            .as_bytes(),
        );
    }
    for event in events {
        hasher.update(format!("e|{}\n", event.event_timestamp.timestamp_millis()).as_bytes());
    }
    hex::encode(hasher.finalize())
}
