//! Configuration for sitelog.
//!
//! One optional TOML file at `~/.config/sitelog/config.toml` (overridable
//! via the `SLG_CONFIG` env var). All keys are optional:
//!
//! - `data_dir` - store location override
//! - `max_store_bytes` - store capacity
//! - `action_log` - whether to append to the action log (default true)
//! - `human_output` - default to human-readable output (default false)
//!
//! Precedence for every setting: CLI flag > env var > config file >
//! built-in default. A missing file yields defaults; a malformed file
//! yields defaults with a stderr warning, never a hard failure.

use std::path::PathBuf;

use serde::Deserialize;

use crate::Result;

/// Parsed configuration file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store location override
    pub data_dir: Option<PathBuf>,

    /// Store capacity in bytes
    pub max_store_bytes: Option<usize>,

    /// Whether to append command records to the action log
    pub action_log: Option<bool>,

    /// Default to human-readable output instead of JSON
    pub human_output: Option<bool>,
}

impl Config {
    /// Load the config file, degrading to defaults when absent or
    /// malformed.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                eprintln!("Warning: could not read {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match Self::from_toml(&raw) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| crate::Error::Other(e.to_string()))
    }

    /// Whether the action log is enabled (default true).
    pub fn action_log_enabled(&self) -> bool {
        self.action_log.unwrap_or(true)
    }

    /// Whether human-readable output is the default (default false).
    pub fn human_output(&self) -> bool {
        self.human_output.unwrap_or(false)
    }
}

/// Path of the config file: `SLG_CONFIG` env var, else
/// `<XDG config dir>/sitelog/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SLG_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("sitelog").join("config.toml"))
}
