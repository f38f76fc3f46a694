//! In-memory local repository implementation.
//!
//! Suitable for unit testing and local development. All data lives in
//! memory behind a `parking_lot::RwLock`, providing fast, deterministic and
//! isolated execution.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::db::repository::{DelayRepository, ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{EventOccurrence, Observation};

/// In-memory local repository.
///
/// # Example
/// ```
/// use transit_delay::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.observation_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    observations: Vec<Observation>,
    events: Vec<EventOccurrence>,
    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            observations: Vec::new(),
            events: Vec::new(),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Create a repository pre-populated with data.
    pub fn with_data(observations: Vec<Observation>, events: Vec<EventOccurrence>) -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData {
                observations,
                events,
                is_healthy: true,
            })),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.observations.clear();
        data.events.clear();
    }

    pub fn observation_count(&self) -> usize {
        self.data.read().observations.len()
    }

    pub fn event_count(&self) -> usize {
        self.data.read().events.len()
    }

    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::InternalError {
                message: "Repository is not healthy".to_string(),
                context: ErrorContext::new(operation).with_entity("local"),
            });
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DelayRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn fetch_observations(&self) -> RepositoryResult<Vec<Observation>> {
        self.check_health("fetch_observations")?;
        Ok(self.data.read().observations.clone())
    }

    async fn fetch_events(&self) -> RepositoryResult<Vec<EventOccurrence>> {
        self.check_health("fetch_events")?;
        Ok(self.data.read().events.clone())
    }

    async fn store_observations(&self, observations: Vec<Observation>) -> RepositoryResult<usize> {
        self.check_health("store_observations")?;
        let mut data = self.data.write();
        data.observations = observations;
        Ok(data.observations.len())
    }

    async fn store_events(&self, events: Vec<EventOccurrence>) -> RepositoryResult<usize> {
        self.check_health("store_events")?;
        let mut data = self.data.write();
        data.events = events;
        Ok(data.events.len())
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn obs(delay: f64) -> Observation {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        Observation::new("U1", Some(0), ts, delay)
    }

    #[tokio::test]
    async fn test_store_replaces_observations() {
        let repo = LocalRepository::new();
        assert_eq!(repo.store_observations(vec![obs(1.0), obs(2.0)]).await.unwrap(), 2);
        assert_eq!(repo.store_observations(vec![obs(3.0)]).await.unwrap(), 1);

        let stored = repo.fetch_observations().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].delay_seconds, 3.0);
    }

    #[tokio::test]
    async fn test_unhealthy_repository_rejects_operations() {
        let repo = LocalRepository::with_data(vec![obs(1.0)], vec![]);
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.fetch_observations().await.unwrap_err();
        assert_eq!(err.context().operation.as_deref(), Some("fetch_observations"));

        repo.set_healthy(true);
        assert_eq!(repo.fetch_observations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap();
        let repo = LocalRepository::with_data(vec![obs(1.0)], vec![EventOccurrence::new(ts)]);
        assert_eq!(repo.event_count(), 1);
        repo.clear();
        assert_eq!(repo.observation_count(), 0);
        assert_eq!(repo.event_count(), 0);
        assert_eq!(repo.backend_name(), "local");
    }
}
