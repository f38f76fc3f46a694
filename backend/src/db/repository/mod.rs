//! Repository trait for delay data storage.
//!
//! - [`error`]: Error types for repository operations
//!
//! Implementations live in [`crate::db::repositories`].

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use async_trait::async_trait;

use crate::models::{EventOccurrence, Observation};

/// Source of historical departures and scheduled events.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait DelayRepository: Send + Sync {
    /// Check if the backing store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// All stored departure observations, in no particular order.
    async fn fetch_observations(&self) -> RepositoryResult<Vec<Observation>>;

    /// All stored event occurrences, in no particular order.
    async fn fetch_events(&self) -> RepositoryResult<Vec<EventOccurrence>>;

    /// Replace the stored observations.
    ///
    /// # Returns
    /// * `Ok(count)` - Number of observations now stored
    /// * `Err(RepositoryError::ReadOnly)` - If the backend cannot be written
    async fn store_observations(&self, observations: Vec<Observation>) -> RepositoryResult<usize>;

    /// Replace the stored events.
    async fn store_events(&self, events: Vec<EventOccurrence>) -> RepositoryResult<usize>;

    /// Short backend name used in logs and health output.
    fn backend_name(&self) -> &'static str;
}
