//! Widget configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (AVAILCAL_*)
//! 2. TOML config file (if AVAILCAL_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Calendar widget configuration.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (AVAILCAL_*)
/// 2. TOML config file (if AVAILCAL_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Maximum number of cached availability responses.
    ///
    /// Set via AVAILCAL_MAX_CACHE_SIZE environment variable.
    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: usize,

    /// Minutes a cached response stays valid.
    ///
    /// Set via AVAILCAL_CACHE_TTL_MINUTES environment variable.
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u64,

    /// Verbose pipeline logging.
    ///
    /// Set via AVAILCAL_DEBUG_MODE environment variable.
    #[serde(default)]
    pub debug_mode: bool,

    /// Base URL of the aggregation endpoint; `/calendar-data` is appended.
    ///
    /// Set via AVAILCAL_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via AVAILCAL_REQUEST_TIMEOUT_MS environment variable.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Quiet period before a resize or navigation is acted on.
    ///
    /// Set via AVAILCAL_DEBOUNCE_MS environment variable.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Container widths below this show a single month.
    ///
    /// Set via AVAILCAL_NARROW_BREAKPOINT environment variable.
    #[serde(default = "default_narrow_breakpoint")]
    pub narrow_breakpoint: f64,

    /// Attempts made to find the widget's day container before giving up.
    ///
    /// Set via AVAILCAL_READY_RETRIES environment variable.
    #[serde(default = "default_ready_retries")]
    pub ready_retries: u32,

    /// Delay between day container lookups.
    ///
    /// Set via AVAILCAL_READY_RETRY_INTERVAL_MS environment variable.
    #[serde(default = "default_ready_retry_interval_ms")]
    pub ready_retry_interval_ms: u64,
}

fn default_max_cache_size() -> usize {
    12
}

fn default_cache_ttl_minutes() -> u64 {
    5
}

fn default_api_base_url() -> String {
    "http://localhost:3000".into()
}

fn default_request_timeout_ms() -> u64 {
    6_000
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_narrow_breakpoint() -> f64 {
    640.0
}

fn default_ready_retries() -> u32 {
    10
}

fn default_ready_retry_interval_ms() -> u64 {
    100
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            max_cache_size: default_max_cache_size(),
            cache_ttl_minutes: default_cache_ttl_minutes(),
            debug_mode: false,
            api_base_url: default_api_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            debounce_ms: default_debounce_ms(),
            narrow_breakpoint: default_narrow_breakpoint(),
            ready_retries: default_ready_retries(),
            ready_retry_interval_ms: default_ready_retry_interval_ms(),
        }
    }
}

impl WidgetConfig {
    /// Cache entry lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes * 60)
    }

    /// Request timeout as Duration for use with reqwest.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Debounce quiet period.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Delay between day container lookups.
    pub fn ready_retry_interval(&self) -> Duration {
        Duration::from_millis(self.ready_retry_interval_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `AVAILCAL_`
    /// 2. TOML file from `AVAILCAL_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("AVAILCAL_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("AVAILCAL_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into()),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
