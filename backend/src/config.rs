//! Configuration file support.
//!
//! Every section of `delay.toml` is optional; missing keys fall back to the
//! defaults below, which reproduce the reference forecasting behavior.
//!
//! ```toml
//! [repository]
//! type = "file"
//! observations_path = "data/stop_times.csv"
//! events_path = "data/matches.csv"
//!
//! [engine]
//! fallback = "relax_filters"
//!
//! [forecast]
//! weekly_interval_minutes = 60
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::db::factory::RepositoryType;
use crate::db::repository::RepositoryError;
use crate::models::EventWindow;

pub const DEFAULT_MIN_BASE_SAMPLES: usize = 5;
pub const DEFAULT_MIN_RECENT_SAMPLES: usize = 3;
pub const DEFAULT_SAMPLE_SATURATION: usize = 30;
pub const DEFAULT_RECENT_WINDOW_MINUTES: i64 = 60;
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;
pub const DEFAULT_SAMPLE_WEIGHT: f64 = 0.4;
pub const DEFAULT_CI_WEIGHT: f64 = 0.4;
pub const DEFAULT_CONDITION_WEIGHT: f64 = 0.2;
pub const DEFAULT_PEAK_PENALTY: f64 = 0.8;
pub const DEFAULT_EVENT_PENALTY: f64 = 0.9;

pub const DEFAULT_SHORT_TERM_INTERVAL_MINUTES: i64 = 15;
pub const DEFAULT_SHORT_TERM_HORIZON_MINUTES: i64 = 180;
pub const DEFAULT_WEEKLY_INTERVAL_MINUTES: i64 = 15;
pub const WEEKLY_SPAN_DAYS: i64 = 7;
/// Longest accepted forecast step, horizon or correction window.
pub const WEEKLY_SPAN_MINUTES: i64 = WEEKLY_SPAN_DAYS * 24 * 60;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_PATH_ENV: &str = "DELAY_CONFIG";

/// What a forecast generator does when a step lacks history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Skip the step and list it in the batch's `skipped` timestamps.
    #[default]
    Strict,
    /// Retry once without stop/direction constraints before skipping.
    RelaxFilters,
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "relax_filters" | "relax" => Ok(Self::RelaxFilters),
            _ => Err(format!("Unknown fallback policy: {}", s)),
        }
    }
}

/// Policy constants of the estimator, the correction term and the
/// reliability model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionPolicy {
    pub min_base_samples: usize,
    pub min_recent_samples: usize,
    pub sample_saturation: usize,
    pub recent_window_minutes: i64,
    pub confidence_level: f64,
    pub sample_weight: f64,
    pub ci_weight: f64,
    pub condition_weight: f64,
    pub peak_penalty: f64,
    pub event_penalty: f64,
    pub fallback: FallbackPolicy,
    pub event_days_before: u32,
    pub event_days_after: u32,
}

impl Default for PredictionPolicy {
    fn default() -> Self {
        Self {
            min_base_samples: DEFAULT_MIN_BASE_SAMPLES,
            min_recent_samples: DEFAULT_MIN_RECENT_SAMPLES,
            sample_saturation: DEFAULT_SAMPLE_SATURATION,
            recent_window_minutes: DEFAULT_RECENT_WINDOW_MINUTES,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            sample_weight: DEFAULT_SAMPLE_WEIGHT,
            ci_weight: DEFAULT_CI_WEIGHT,
            condition_weight: DEFAULT_CONDITION_WEIGHT,
            peak_penalty: DEFAULT_PEAK_PENALTY,
            event_penalty: DEFAULT_EVENT_PENALTY,
            fallback: FallbackPolicy::Strict,
            event_days_before: 0,
            event_days_after: 0,
        }
    }
}

impl PredictionPolicy {
    pub fn event_window(&self) -> EventWindow {
        EventWindow::new(self.event_days_before, self.event_days_after)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_base_samples == 0 {
            return Err("engine.min_base_samples must be at least 1".to_string());
        }
        if self.sample_saturation == 0 {
            return Err("engine.sample_saturation must be at least 1".to_string());
        }
        if !(1..=WEEKLY_SPAN_MINUTES).contains(&self.recent_window_minutes) {
            return Err(format!(
                "engine.recent_window_minutes must lie in [1, {}], got {}",
                WEEKLY_SPAN_MINUTES, self.recent_window_minutes
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(format!(
                "engine.confidence_level must lie in (0, 1), got {}",
                self.confidence_level
            ));
        }
        let weights = [self.sample_weight, self.ci_weight, self.condition_weight];
        if weights.iter().any(|w| *w < 0.0) {
            return Err("engine weights must be non-negative".to_string());
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(format!("engine weights must sum to 1, got {}", total));
        }
        for (name, penalty) in [
            ("peak_penalty", self.peak_penalty),
            ("event_penalty", self.event_penalty),
        ] {
            if !(0.0..=1.0).contains(&penalty) {
                return Err(format!("engine.{} must lie in [0, 1], got {}", name, penalty));
            }
        }
        Ok(())
    }
}

/// Step sizes and horizons of the forecast generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    pub short_term_interval_minutes: i64,
    pub short_term_horizon_minutes: i64,
    pub weekly_interval_minutes: i64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            short_term_interval_minutes: DEFAULT_SHORT_TERM_INTERVAL_MINUTES,
            short_term_horizon_minutes: DEFAULT_SHORT_TERM_HORIZON_MINUTES,
            weekly_interval_minutes: DEFAULT_WEEKLY_INTERVAL_MINUTES,
        }
    }
}

impl ForecastSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.short_term_interval_minutes <= 0 || self.weekly_interval_minutes <= 0 {
            return Err("forecast intervals must be positive".to_string());
        }
        if self.short_term_horizon_minutes < self.short_term_interval_minutes {
            return Err("forecast.short_term_horizon_minutes must cover at least one interval".to_string());
        }
        if self.short_term_horizon_minutes > WEEKLY_SPAN_MINUTES || self.weekly_interval_minutes > WEEKLY_SPAN_MINUTES {
            return Err(format!("forecast horizons and intervals must not exceed {} minutes", WEEKLY_SPAN_MINUTES));
        }
        Ok(())
    }
}

/// Repository backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
    #[serde(default)]
    pub observations_path: Option<PathBuf>,
    #[serde(default)]
    pub events_path: Option<PathBuf>,
}

fn default_repo_type() -> String {
    "local".to_string()
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
            observations_path: None,
            events_path: None,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub engine: PredictionPolicy,
    #[serde(default)]
    pub forecast: ForecastSettings,
}

impl AppConfig {
    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, RepositoryError> {
        let config: AppConfig = toml::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `delay.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        let search_paths = [
            PathBuf::from("delay.toml"),
            PathBuf::from("backend/delay.toml"),
            PathBuf::from("../delay.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(RepositoryError::configuration(
            "No delay.toml found in standard locations",
        ))
    }

    /// Resolve configuration the way the server does: `DELAY_CONFIG` first,
    /// then the default locations, then built-in defaults.
    pub fn load() -> Result<Self, RepositoryError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_file(path);
        }
        match Self::from_default_location() {
            Ok(config) => Ok(config),
            Err(RepositoryError::ConfigurationError { message, .. })
                if message.starts_with("No delay.toml") =>
            {
                log::info!("No delay.toml found, using built-in defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn validate(&self) -> Result<(), RepositoryError> {
        self.repository_type()
            .map_err(RepositoryError::configuration)?;
        self.engine
            .validate()
            .map_err(RepositoryError::configuration)?;
        self.forecast
            .validate()
            .map_err(RepositoryError::configuration)?;
        Ok(())
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repository.repo_type)
    }
}
