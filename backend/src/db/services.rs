//! High-level data-access operations.
//!
//! Repository-agnostic functions that work with any [`DelayRepository`]
//! implementation. The HTTP layer and the server binary go through these
//! rather than calling the repository directly.

use log::{info, warn};

use super::repository::{DelayRepository, RepositoryError, RepositoryResult};
use super::snapshot::DatasetSnapshot;
use crate::models::{EventOccurrence, EventWindow, Observation};

/// Check if the repository is reachable.
pub async fn health_check(repo: &dyn DelayRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Fetch both tables and build an immutable snapshot.
pub async fn load_snapshot(
    repo: &dyn DelayRepository,
    event_window: EventWindow,
) -> RepositoryResult<DatasetSnapshot> {
    let observations = repo.fetch_observations().await?;
    let events = repo.fetch_events().await?;

    if observations.is_empty() {
        warn!("{} repository returned no observations", repo.backend_name());
    }

    let snapshot = tokio::task::spawn_blocking(move || {
        DatasetSnapshot::new(observations, events, event_window)
    })
    .await
    .map_err(|e| RepositoryError::internal(format!("Snapshot build failed: {}", e)))?;

    info!(
        "Built snapshot from {} repository: {} observations, {} event dates, checksum {}",
        repo.backend_name(),
        snapshot.len(),
        snapshot.calendar().len(),
        snapshot.checksum()
    );
    Ok(snapshot)
}

/// Replace stored observations and return the rebuilt snapshot.
pub async fn replace_observations(
    repo: &dyn DelayRepository,
    observations: Vec<Observation>,
    event_window: EventWindow,
) -> RepositoryResult<DatasetSnapshot> {
    let stored = repo.store_observations(observations).await?;
    info!("Stored {} observations", stored);
    load_snapshot(repo, event_window).await
}

/// Replace stored events and return the rebuilt snapshot.
pub async fn replace_events(
    repo: &dyn DelayRepository,
    events: Vec<EventOccurrence>,
    event_window: EventWindow,
) -> RepositoryResult<DatasetSnapshot> {
    let stored = repo.store_events(events).await?;
    info!("Stored {} events", stored);
    load_snapshot(repo, event_window).await
}
