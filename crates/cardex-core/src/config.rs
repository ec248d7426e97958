//! Configuration management for Cardex.
//!
//! Replaces ambient endpoint and header globals with one explicit object
//! that is handed to the fetch layer and each collector at construction.
//! Loaded from TOML with XDG-compliant paths and environment overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration.
///
/// This is loaded from `~/.config/cardex/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Upstream endpoints and identifying headers
    pub source: SourceConfig,
    /// Timeout, retry and batching settings
    pub fetch: FetchConfig,
    /// Worker pool and collector settings
    pub collector: CollectorConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            Self::from_toml(&contents)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `CARDEX_API_URL`: Override the query endpoint
    /// - `CARDEX_MAX_ATTEMPTS`: Override the retry budget
    /// - `CARDEX_MAX_WORKERS`: Override the worker pool size
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CARDEX_API_URL") {
            tracing::debug!("Override source.api_url from env: {}", val);
            self.source.api_url = val;
        }

        if let Ok(val) = std::env::var("CARDEX_MAX_ATTEMPTS") {
            if let Ok(attempts) = val.parse() {
                self.fetch.max_attempts = attempts;
                tracing::debug!("Override fetch.max_attempts from env: {}", attempts);
            }
        }

        if let Ok(val) = std::env::var("CARDEX_MAX_WORKERS") {
            if let Ok(workers) = val.parse() {
                self.collector.max_concurrent_workers = workers;
                tracing::debug!(
                    "Override collector.max_concurrent_workers from env: {}",
                    workers
                );
            }
        }
    }

    /// Reject values that would stall or break the pipeline.
    pub fn validate(&self) -> ConfigResult<()> {
        let zero_checks = [
            ("fetch.max_attempts", self.fetch.max_attempts == 0),
            ("fetch.batch_size", self.fetch.batch_size == 0),
            ("fetch.timeout_secs", self.fetch.timeout_secs == 0),
            (
                "collector.max_concurrent_workers",
                self.collector.max_concurrent_workers == 0,
            ),
            ("collector.sets_per_batch", self.collector.sets_per_batch == 0),
            (
                "collector.image_batch_size",
                self.collector.image_batch_size == 0,
            ),
            (
                "collector.search_page_size",
                self.collector.search_page_size == 0,
            ),
        ];

        for (field, is_zero) in zero_checks {
            if is_zero {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if self.source.api_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "source.api_url".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/cardex/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "cardex", "cardex").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path, where reference tables live by default.
    ///
    /// Uses XDG base directories: `~/.local/share/cardex`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "cardex", "cardex").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Upstream endpoints and the identifying header set sent with every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Query API endpoint (revisions, images, redirects)
    pub api_url: String,
    /// Semantic search endpoint
    pub semantic_url: String,
    /// User agent string
    pub user_agent: String,
    /// Contact address sent in the `From` header
    pub from: Option<String>,
    /// Additional headers
    pub headers: BTreeMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://yugipedia.com/api.php".to_string(),
            semantic_url: "https://yugipedia.com/index.php".to_string(),
            user_agent: "Cardex/0.1.0 (+https://github.com/cardex/cardex)".to_string(),
            from: None,
            headers: BTreeMap::new(),
        }
    }
}

/// Timeout, retry and batching settings for upstream calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-call wall-clock timeout in seconds
    pub timeout_secs: u64,
    /// Attempts per call, including the first
    pub max_attempts: u32,
    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum titles per batch request
    pub batch_size: usize,
}

impl FetchConfig {
    /// Per-call timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay between attempts.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 50,
            max_attempts: 5,
            retry_delay_ms: 1000,
            batch_size: 50,
        }
    }
}

/// Worker pool and collector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Concurrent workers per pass
    pub max_concurrent_workers: usize,
    /// Sets handled by one collector worker
    pub sets_per_batch: usize,
    /// Image files per URL-resolution request
    pub image_batch_size: usize,
    /// Rows per semantic search page
    pub search_page_size: usize,
    /// Page-name initials the card search fans out over
    pub search_initials: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        let search_initials = ('A'..='Z')
            .chain('0'..='9')
            .map(String::from)
            .chain(["\"", "@", "#"].into_iter().map(String::from))
            .collect();

        Self {
            max_concurrent_workers: 8,
            sets_per_batch: 1,
            image_batch_size: 50,
            search_page_size: 500,
            search_initials,
        }
    }
}
