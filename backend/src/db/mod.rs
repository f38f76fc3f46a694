//! Data access for delay observations and event schedules.
//!
//! This module provides abstractions for storage via the Repository pattern,
//! allowing different backends to be swapped easily, and the immutable
//! [`DatasetSnapshot`] every engine call reads.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (REST API, server binary)            │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs)                            │
//! │  - Snapshot loading and rebuilds                        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Trait (repository/) - Abstract Interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//!     │                                │
//! ┌───▼──────────────┐     ┌───────────▼─────────────┐
//! │ Local Repository │     │ File Repository         │
//! │ (in-memory)      │     │ (CSV/JSON, read-only)   │
//! └──────────────────┘     └─────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use transit_delay::config::AppConfig;
//! use transit_delay::db::{services, RepositoryFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let repo = RepositoryFactory::create(&config)?;
//!     let snapshot = services::load_snapshot(repo.as_ref(), config.engine.event_window()).await?;
//!     println!("{} observations", snapshot.len());
//!     Ok(())
//! }
//! ```

#[cfg(not(any(feature = "local-repo", feature = "file-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod checksum;
pub mod factory;
pub mod loaders;
pub mod repositories;
pub mod repository;
pub mod services;
pub mod snapshot;

pub use checksum::{calculate_checksum, dataset_checksum};
pub use factory::{RepositoryFactory, RepositoryType};
pub use loaders::{Loaded, RawObservation};
#[cfg(feature = "file-repo")]
pub use repositories::FileRepository;
#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
pub use repository::{DelayRepository, ErrorContext, RepositoryError, RepositoryResult};
pub use services::{health_check, load_snapshot};
pub use snapshot::{DatasetSnapshot, SeriesIndex};
