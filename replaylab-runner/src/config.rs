//! Run configuration files.
//!
//! A run is described by one TOML file deserialized straight into
//! `SimConfig`:
//!
//! ```toml
//! start = "2024-01-02"
//! warmup_start = "2023-10-02"
//! end = "2024-12-31"
//! initial_cash = 100000.0
//!
//! [costs]
//! per_contract = 0.65
//!
//! [[sources]]
//! type = "csv"
//! path = "data/spy.csv"
//!
//! [[sources]]
//! type = "synthetic"
//! symbol = "SYN"
//! seed = 42
//! ```
//!
//! Relative CSV paths are resolved against the config file's directory.

use std::path::{Path, PathBuf};
use thiserror::Error;

use replaylab_core::config::{ConfigError, SimConfig, SourceConfig};

/// Unique identifier for a run configuration (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Parse and validate a TOML run configuration.
pub fn parse_config(text: &str) -> Result<SimConfig, ConfigFileError> {
    let config: SimConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Read a TOML run configuration from disk, resolving relative CSV paths
/// against the file's directory, then validate it.
pub fn load_config(path: &Path) -> Result<SimConfig, ConfigFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: SimConfig = toml::from_str(&text)?;
    if let Some(base) = path.parent() {
        resolve_paths(&mut config, base);
    }
    config.validate()?;
    tracing::debug!(path = %path.display(), sources = config.sources.len(), "config loaded");
    Ok(config)
}

fn resolve_paths(config: &mut SimConfig, base: &Path) {
    for source in &mut config.sources {
        if let SourceConfig::Csv { path, .. } = source {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Deterministic hash ID for a configuration.
///
/// Two runs with identical configs share the same id.
pub fn run_id(config: &SimConfig) -> RunId {
    let json = serde_json::to_string(config).unwrap_or_default();
    blake3::hash(json.as_bytes()).to_hex().to_string()
}
