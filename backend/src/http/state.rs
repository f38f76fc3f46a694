//! Application state for the HTTP server.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::{AppConfig, ForecastSettings, PredictionPolicy};
use crate::db::repository::DelayRepository;
use crate::db::DatasetSnapshot;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for data access
    pub repository: Arc<dyn DelayRepository>,
    /// Loaded configuration (engine policy and generator settings)
    pub config: Arc<AppConfig>,
    /// Current dataset; swapped as a whole when data is ingested
    snapshot: Arc<RwLock<DatasetSnapshot>>,
    /// Held across store, rebuild and swap so uploads apply one at a time
    ingest_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(repository: Arc<dyn DelayRepository>, config: AppConfig, snapshot: DatasetSnapshot) -> Self {
        Self {
            repository,
            config: Arc::new(config),
            snapshot: Arc::new(RwLock::new(snapshot)),
            ingest_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Handle to the current snapshot. Cheap; the data itself is shared.
    pub fn snapshot(&self) -> DatasetSnapshot {
        self.snapshot.read().clone()
    }

    pub fn replace_snapshot(&self, snapshot: DatasetSnapshot) {
        *self.snapshot.write() = snapshot;
    }

    /// Exclusive right to write the repository and publish a new snapshot.
    ///
    /// Readers are not blocked; they keep using the snapshot they cloned.
    pub async fn lock_ingestion(&self) -> MutexGuard<'_, ()> {
        self.ingest_lock.lock().await
    }

    pub fn policy(&self) -> &PredictionPolicy {
        &self.config.engine
    }

    pub fn forecast_settings(&self) -> &ForecastSettings {
        &self.config.forecast
    }
}
