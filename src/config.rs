//! Configuration management for raiden
//!
//! Nothing here changes the shard format or file naming; options only
//! tune verification and durability.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Codec configuration
    pub codec: CodecConfig,

    /// Shard store configuration
    pub store: StoreConfig,
}

/// Codec configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CodecConfig {
    /// Recompute parity on merge when every shard is present
    pub verify_parity: bool,
}

/// Shard store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// fsync each output file before renaming it into place
    pub sync_writes: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            verify_parity: true,
        }
    }
}

impl Config {
    /// Load configuration from a file, with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve the configuration for one invocation
    ///
    /// An explicit path must exist. Otherwise the per-user config file is
    /// used when present, and built-in defaults when not.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        Self::resolve_with(explicit, Self::default_path())
    }

    fn resolve_with(explicit: Option<&Path>, fallback: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Some(path) = fallback.filter(|p| p.is_file()) {
            debug!("Using config file {:?}", path);
            return Self::load(path);
        }

        let mut config = Config::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Per-user config file location (`<config_dir>/raiden/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("raiden").join("config.json"))
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from `lookup`; unset or unparseable values are ignored
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let flag = |name: &str| lookup(name).and_then(|value| parse_flag(&value));

        if let Some(verify) = flag("RAIDEN_VERIFY_PARITY") {
            self.codec.verify_parity = verify;
        }

        if let Some(sync) = flag("RAIDEN_SYNC_WRITES") {
            self.store.sync_writes = sync;
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
