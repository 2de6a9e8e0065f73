//! Configuration for the panel engine
//!
//! All knobs live in one TOML document. Every key is optional; an empty file
//! (or no file at all) yields [`PanelConfig::default`].
//!
//! ```toml
//! [mapper]
//! max_workers = 16        # cap on concurrent units per batch
//!
//! [cascade]
//! max_rounds = 64         # minimum round limit; raised to the field count
//!
//! [isolation]
//! policy = "sequential"   # or "reject"
//! ```
//!
//! The `PANEL_MAX_WORKERS` environment variable overrides `mapper.max_workers`
//! when loading through [`PanelConfig::load_with_env`].

mod parser;

pub use parser::parse_config;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{DEFAULT_MAX_CASCADE_ROUNDS, MAX_WORKERS_ENV, default_max_workers};
use crate::core::PanelError;
use crate::resolution::IsolationPolicy;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Ordered concurrent mapper settings.
    #[serde(default)]
    pub mapper: MapperConfig,

    /// Cascade resolver settings.
    #[serde(default)]
    pub cascade: CascadeConfig,

    /// Descriptor isolation settings.
    #[serde(default)]
    pub isolation: IsolationConfig,
}

/// `[mapper]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Maximum number of concurrent workers per batch.
    ///
    /// Default: 2 × CPU cores, at least [`crate::constants::MIN_PARALLELISM`].
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

/// `[cascade]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Minimum propagation rounds allowed before the resolver reports
    /// [`PanelError::CascadeLimitExceeded`]; field-sets with more fields get
    /// one round per field.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

const fn default_max_rounds() -> usize {
    DEFAULT_MAX_CASCADE_ROUNDS
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

/// `[isolation]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolationConfig {
    /// What to do with field-sets containing a descriptor that cannot be duplicated.
    #[serde(default)]
    pub policy: IsolationPolicy,
}

impl PanelConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, PanelError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let config: Self = parse_config(path)?;
        config.validate()?;
        tracing::debug!(
            "Loaded panel config from {}: max_workers={}, max_rounds={}, isolation={:?}",
            path.display(),
            config.mapper.max_workers,
            config.cascade.max_rounds,
            config.isolation.policy
        );
        Ok(config)
    }

    /// Load a configuration file (if given) and apply environment overrides.
    ///
    /// A missing path yields the defaults.
    pub fn load_with_env(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::default(),
        };

        if let Ok(raw) = std::env::var(MAX_WORKERS_ENV) {
            config.mapper.max_workers = parse_worker_override(&raw)?;
            tracing::debug!("{} overrides max_workers to {}", MAX_WORKERS_ENV, config.mapper.max_workers);
        }

        Ok(config)
    }

    /// Reject values that would make the engine unusable.
    pub fn validate(&self) -> Result<(), PanelError> {
        if self.mapper.max_workers == 0 {
            return Err(PanelError::ConfigError {
                message: "mapper.max_workers must be at least 1".to_string(),
            });
        }
        if self.cascade.max_rounds == 0 {
            return Err(PanelError::ConfigError {
                message: "cascade.max_rounds must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_worker_override(raw: &str) -> Result<usize, PanelError> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(PanelError::ConfigError {
            message: format!("{MAX_WORKERS_ENV} must be a positive integer, got '{raw}'"),
        }),
        Ok(workers) => Ok(workers),
    }
}
