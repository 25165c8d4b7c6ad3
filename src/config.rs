//! Top-level application configuration.
//!
//! Configuration is stored in `.listwin/config.yaml`. Every field has a
//! default, so a missing file is the same as an empty one.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::EngineOptions;
use crate::error::{ListwinError, Result};
use crate::types::{DEFAULT_MAX_WINDOW, DEFAULT_PAGE_SIZE, listwin_root};

/// Keys accepted by `config get` / `config set`.
pub const CONFIG_KEYS: &[&str] = &[
    "base_url",
    "page_size",
    "max_window",
    "throttle_ms",
    "debounce_ms",
    "recheck_ms",
    "scroll_threshold_px",
    "cache_expiry_secs",
    "request_timeout_secs",
    "cache_dir",
];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// List API base URL. `LISTWIN_BASE_URL` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_max_window")]
    pub max_window: usize,

    /// Minimum spacing between edge fetches, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub throttle_ms: u64,

    #[serde(default = "default_interval_ms")]
    pub debounce_ms: u64,

    /// Delay before the top edge is re-checked after the window changed.
    #[serde(default = "default_interval_ms")]
    pub recheck_ms: u64,

    #[serde(default = "default_scroll_threshold_px")]
    pub scroll_threshold_px: f64,

    #[serde(default = "default_cache_expiry_secs")]
    pub cache_expiry_secs: u64,

    /// HTTP request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Where cursor cache files go. Defaults to the platform cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_window() -> usize {
    DEFAULT_MAX_WINDOW
}

fn default_interval_ms() -> u64 {
    300
}

fn default_scroll_threshold_px() -> f64 {
    10.0
}

fn default_cache_expiry_secs() -> u64 {
    60 * 60
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            page_size: default_page_size(),
            max_window: default_max_window(),
            throttle_ms: default_interval_ms(),
            debounce_ms: default_interval_ms(),
            recheck_ms: default_interval_ms(),
            scroll_threshold_px: default_scroll_threshold_px(),
            cache_expiry_secs: default_cache_expiry_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_dir: None,
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        listwin_root().join("config.yaml")
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            ListwinError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ListwinError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            ListwinError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ListwinError::Config("page_size must be at least 1".to_string()));
        }
        if self.max_window == 0 {
            return Err(ListwinError::Config("max_window must be at least 1".to_string()));
        }
        if !self.scroll_threshold_px.is_finite() || self.scroll_threshold_px < 0.0 {
            return Err(ListwinError::Config(
                "scroll_threshold_px must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the List API base URL from the environment or the config file
    pub fn base_url(&self) -> Option<String> {
        if let Ok(url) = env::var("LISTWIN_BASE_URL")
            && !url.is_empty()
        {
            return Some(url);
        }

        self.base_url.clone()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_expiry(&self) -> Duration {
        Duration::from_secs(self.cache_expiry_secs)
    }

    /// Directory for cursor cache files.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(crate::cache::cache_dir)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            page_size: self.page_size,
            max_window: self.max_window,
            throttle: Duration::from_millis(self.throttle_ms),
            debounce: Duration::from_millis(self.debounce_ms),
            recheck_delay: Duration::from_millis(self.recheck_ms),
            scroll_threshold_px: self.scroll_threshold_px,
        }
    }

    /// Current value of `key` as text, `None` when unset.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "base_url" => self.base_url.clone(),
            "page_size" => Some(self.page_size.to_string()),
            "max_window" => Some(self.max_window.to_string()),
            "throttle_ms" => Some(self.throttle_ms.to_string()),
            "debounce_ms" => Some(self.debounce_ms.to_string()),
            "recheck_ms" => Some(self.recheck_ms.to_string()),
            "scroll_threshold_px" => Some(self.scroll_threshold_px.to_string()),
            "cache_expiry_secs" => Some(self.cache_expiry_secs.to_string()),
            "request_timeout_secs" => Some(self.request_timeout_secs.to_string()),
            "cache_dir" => self.cache_dir.as_ref().map(|p| p.display().to_string()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Parse `value` into the field named by `key`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "base_url" => {
                url::Url::parse(value)?;
                self.base_url = Some(value.to_string());
            }
            "page_size" => self.page_size = parse_number(key, value)?,
            "max_window" => self.max_window = parse_number(key, value)?,
            "throttle_ms" => self.throttle_ms = parse_number(key, value)?,
            "debounce_ms" => self.debounce_ms = parse_number(key, value)?,
            "recheck_ms" => self.recheck_ms = parse_number(key, value)?,
            "scroll_threshold_px" => self.scroll_threshold_px = parse_number(key, value)?,
            "cache_expiry_secs" => self.cache_expiry_secs = parse_number(key, value)?,
            "request_timeout_secs" => self.request_timeout_secs = parse_number(key, value)?,
            "cache_dir" => self.cache_dir = Some(PathBuf::from(value)),
            _ => return Err(unknown_key(key)),
        }
        self.validate()
    }
}

fn unknown_key(key: &str) -> ListwinError {
    ListwinError::Config(format!(
        "unknown config key '{key}'. Valid keys: {}",
        CONFIG_KEYS.join(", ")
    ))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ListwinError::Config(format!("invalid value '{value}' for {key}")))
}
