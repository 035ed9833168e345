use crate::error::{FixtureError, Result};
use crate::scenario::clock::{parse_timestamp, DEFAULT_STABLE_NOW};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "repo-fixtures.toml";

/// Represents the complete configuration for repo-fixtures.
///
/// Contains the commit identity, the clock start and the cache location.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct FixtureConfig {
    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub clock: ClockConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_author_name() -> String {
    "semantic-release".to_string()
}

fn default_author_email() -> String {
    "semantic-release@example.com".to_string()
}

fn default_stable_now() -> String {
    DEFAULT_STABLE_NOW.to_string()
}

/// Identity written into every generated commit and tag.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    #[serde(default = "default_author_name")]
    pub author_name: String,

    #[serde(default = "default_author_email")]
    pub author_email: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            author_name: default_author_name(),
            author_email: default_author_email(),
        }
    }
}

/// Where the commit clock starts counting.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClockConfig {
    #[serde(default = "default_stable_now")]
    pub stable_now: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            stable_now: default_stable_now(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct CacheConfig {
    /// Overrides the per-user cache directory
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    /// The configured directory, else `<user cache dir>/repo-fixtures`, else the temp dir
    pub fn resolved_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("repo-fixtures"),
        }
    }
}

impl FixtureConfig {
    fn validate(self) -> Result<Self> {
        parse_timestamp(&self.clock.stable_now).map_err(|e| {
            FixtureError::config(format!("Invalid clock.stable_now: {}", e))
        })?;
        if self.git.author_name.trim().is_empty() || self.git.author_email.trim().is_empty() {
            return Err(FixtureError::config("git author name and email must not be empty"));
        }
        Ok(self)
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `repo-fixtures.toml` in current directory
/// 3. `repo-fixtures.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(FixtureConfig)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>) -> Result<FixtureConfig> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)
            .map_err(|e| FixtureError::config(format!("Cannot read {}: {}", path, e)))?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        fs::read_to_string(CONFIG_FILE_NAME)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(FixtureConfig::default());
        }
    } else {
        return Ok(FixtureConfig::default());
    };

    let config: FixtureConfig = toml::from_str(&config_str)
        .map_err(|e| FixtureError::config(format!("Invalid configuration: {}", e)))?;
    config.validate()
}
