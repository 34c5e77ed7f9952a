//! Operator config file (JSON).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use prunephysics_logic::config::PruneConfig;
use prunephysics_logic::error::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// Read and validate a config file. Missing keys take their defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<PruneConfig, SettingsError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: PruneConfig = serde_json::from_str(&text).map_err(|source| SettingsError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate().map_err(|source| SettingsError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

/// Write a config file, pretty-printed.
pub fn save_config(path: impl AsRef<Path>, config: &PruneConfig) -> Result<(), SettingsError> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(config).map_err(|source| SettingsError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}
