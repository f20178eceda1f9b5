//! DevSim configuration system
//!
//! Project-level configuration loaded from `devsim.toml` in the working
//! directory, with serde defaults when the file or any key is absent.
//!
//! ```toml
//! [scripts]
//! dir = "scripts"
//!
//! [log]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name looked up in the working directory
pub const CONFIG_FILE: &str = "devsim.toml";

/// Project-level configuration for DevSim
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimConfig {
    /// Script resolution settings
    #[serde(default)]
    pub scripts: ScriptsConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Script resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Directory containing device behavior scripts
    #[serde(default = "default_scripts_dir")]
    pub dir: PathBuf,
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            dir: default_scripts_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum severity: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Load configuration from `devsim.toml` under `dir`.
/// Returns default config if the file doesn't exist.
pub fn load_config(dir: &Path) -> Result<SimConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(SimConfig::default());
    }

    let content = fs::read_to_string(&path)?;
    Ok(toml::from_str(&content)?)
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests;
