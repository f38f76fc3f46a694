//! Read-only repository backed by observation and event files.
//!
//! Files are re-read on every fetch so an operator can drop in a new
//! export without restarting the server.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::db::loaders::{load_events, load_observations};
use crate::db::repository::{DelayRepository, ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{EventOccurrence, Observation};

#[derive(Debug, Clone)]
pub struct FileRepository {
    observations_path: PathBuf,
    events_path: Option<PathBuf>,
}

impl FileRepository {
    /// # Arguments
    /// * `observations_path` - CSV or JSON file with departure observations
    /// * `events_path` - Optional semicolon-delimited event schedule
    pub fn new(observations_path: impl Into<PathBuf>, events_path: Option<PathBuf>) -> Self {
        Self {
            observations_path: observations_path.into(),
            events_path,
        }
    }

    pub fn observations_path(&self) -> &Path {
        &self.observations_path
    }

    pub fn events_path(&self) -> Option<&Path> {
        self.events_path.as_deref()
    }

    fn read_only(operation: &str) -> RepositoryError {
        RepositoryError::ReadOnly {
            message: "File repository is read-only".to_string(),
            context: ErrorContext::new(operation).with_entity("file"),
        }
    }
}

#[async_trait]
impl DelayRepository for FileRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        let events_ok = self.events_path.as_ref().map_or(true, |p| p.is_file());
        Ok(self.observations_path.is_file() && events_ok)
    }

    async fn fetch_observations(&self) -> RepositoryResult<Vec<Observation>> {
        let path = self.observations_path.clone();
        let loaded = tokio::task::spawn_blocking(move || load_observations(&path))
            .await
            .map_err(|e| RepositoryError::internal(format!("Loader task failed: {}", e)))??;
        Ok(loaded.records)
    }

    async fn fetch_events(&self) -> RepositoryResult<Vec<EventOccurrence>> {
        let Some(path) = self.events_path.clone() else {
            return Ok(Vec::new());
        };
        let loaded = tokio::task::spawn_blocking(move || load_events(&path))
            .await
            .map_err(|e| RepositoryError::internal(format!("Loader task failed: {}", e)))??;
        Ok(loaded.records)
    }

    async fn store_observations(&self, _observations: Vec<Observation>) -> RepositoryResult<usize> {
        Err(Self::read_only("store_observations"))
    }

    async fn store_events(&self, _events: Vec<EventOccurrence>) -> RepositoryResult<usize> {
        Err(Self::read_only("store_events"))
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
