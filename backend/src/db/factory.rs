//! Repository factory for dependency injection.
//!
//! Builds repository instances from runtime configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "file-repo")]
use super::repositories::FileRepository;
#[cfg(feature = "local-repo")]
use super::repositories::LocalRepository;
use super::repository::{DelayRepository, RepositoryError, RepositoryResult};
use crate::config::AppConfig;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
    /// Read-only CSV/JSON files
    File,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("local", "file").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "file" | "files" => Ok(Self::File),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```
/// use transit_delay::config::AppConfig;
/// use transit_delay::db::RepositoryFactory;
///
/// let repo = RepositoryFactory::create(&AppConfig::default()).unwrap();
/// assert_eq!(repo.backend_name(), "local");
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create the repository selected by `config.repository`.
    ///
    /// # Returns
    /// * `Ok(Arc<dyn DelayRepository>)` - Repository instance
    /// * `Err(RepositoryError::ConfigurationError)` - Unknown type, missing
    ///   path, or backend feature not enabled
    pub fn create(config: &AppConfig) -> RepositoryResult<Arc<dyn DelayRepository>> {
        let repo_type = config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;

        match repo_type {
            RepositoryType::Local => Self::create_local(),
            RepositoryType::File => {
                let observations = config.repository.observations_path.clone().ok_or_else(|| {
                    RepositoryError::configuration(
                        "File repository requires repository.observations_path",
                    )
                })?;
                Self::create_file(observations, config.repository.events_path.clone())
            }
        }
    }

    /// Create an in-memory local repository.
    pub fn create_local() -> RepositoryResult<Arc<dyn DelayRepository>> {
        #[cfg(feature = "local-repo")]
        {
            Ok(Arc::new(LocalRepository::new()))
        }
        #[cfg(not(feature = "local-repo"))]
        {
            Err(RepositoryError::configuration(
                "Local repository feature not enabled",
            ))
        }
    }

    /// Create a read-only file repository.
    pub fn create_file(
        observations_path: PathBuf,
        events_path: Option<PathBuf>,
    ) -> RepositoryResult<Arc<dyn DelayRepository>> {
        #[cfg(feature = "file-repo")]
        {
            Ok(Arc::new(FileRepository::new(observations_path, events_path)))
        }
        #[cfg(not(feature = "file-repo"))]
        {
            let _ = (observations_path, events_path);
            Err(RepositoryError::configuration(
                "File repository feature not enabled",
            ))
        }
    }
}
