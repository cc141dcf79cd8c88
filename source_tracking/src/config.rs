//! Configuration for source tracking.
//!
//! Loaded from `source_tracking_config.json` with support for an environment
//! variable override.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

pub use crate::composition::CompositionOrder;

pub const BUILTIN_SOURCE_TRACKING_CONFIG: &str = include_str!("data/source_tracking_config.json");

pub const CONFIG_PATH_ENV: &str = "SOURCE_TRACKING_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceTrackingConfig {
    pub composition: CompositionConfig,
    pub parallel: ParallelConfig,
    pub fractions: FractionConfig,
}

impl SourceTrackingConfig {
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_SOURCE_TRACKING_CONFIG)
            .expect("builtin source tracking config should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = SourceTrackingConfig::from_json_str(&contents)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    pub order: CompositionOrder,
}

/// Rayon fan-out for per-cell materialization and summarization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    pub enabled: bool,
    pub min_cells: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_cells: 4096,
        }
    }
}

impl ParallelConfig {
    pub fn should_parallelize(&self, cells: usize) -> bool {
        self.enabled && cells >= self.min_cells
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FractionConfig {
    pub tolerance: f64,
}

impl Default for FractionConfig {
    fn default() -> Self {
        Self { tolerance: 1e-6 }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse source tracking config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read source tracking config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Builtin,
}

/// Loads the file named by `SOURCE_TRACKING_CONFIG_PATH`, falling back to the
/// builtin configuration when the variable is unset or the file is unusable.
pub fn load_config_from_env() -> (SourceTrackingConfig, ConfigSource) {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).map(PathBuf::from) {
        match SourceTrackingConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "source_tracking::config",
                    path = %path.display(),
                    "source_tracking_config.loaded=file"
                );
                return (config, ConfigSource::File(path));
            }
            Err(err) => {
                tracing::warn!(
                    target: "source_tracking::config",
                    path = %path.display(),
                    error = %err,
                    "source_tracking_config.load_failed"
                );
            }
        }
    }

    tracing::info!(
        target: "source_tracking::config",
        "source_tracking_config.loaded=builtin"
    );
    (SourceTrackingConfig::builtin(), ConfigSource::Builtin)
}
