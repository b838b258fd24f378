//! Configuration schema for gradle-cache
//!
//! Configuration is stored at `~/.config/gradle-cache/config.toml`. Every
//! setting has a default, so an empty or missing file is valid.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache storage settings
    pub cache: CacheConfig,

    /// Job inputs, lowest precedence (e.g. `wrapper-cache-enabled = "read-only"`)
    pub inputs: HashMap<String, String>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Key prefix used when `CACHE_KEY_PREFIX` is not set
    pub key_prefix: Option<String>,

    /// Root of the local cache store
    pub store_dir: Option<PathBuf>,

    /// File carrying state from restore to save
    pub state_file: Option<PathBuf>,

    /// Gradle user home (defaults to `GRADLE_USER_HOME` or `~/.gradle`)
    pub gradle_user_home: Option<PathBuf>,
}
