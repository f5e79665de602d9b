//! Configuration validation rules.
//!
//! This module provides validation logic for `WidgetConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::WidgetConfig;
use thiserror::Error;
use url::Url;

/// Upper bound on `max_cache_size`.
const MAX_CACHE_SIZE_LIMIT: usize = 256;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl WidgetConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `api_base_url` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `max_cache_size` is 0 or exceeds 256
    /// - `cache_ttl_minutes` is 0
    /// - `api_base_url` is not an http(s) URL
    /// - `request_timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `narrow_breakpoint` is not a positive number
    /// - `ready_retries` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cache_size == 0 {
            return Err(ConfigError::Invalid {
                field: "max_cache_size".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_cache_size > MAX_CACHE_SIZE_LIMIT {
            return Err(ConfigError::Invalid {
                field: "max_cache_size".into(),
                reason: format!("must not exceed {MAX_CACHE_SIZE_LIMIT}"),
            });
        }

        if self.cache_ttl_minutes == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_minutes".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "api_base_url".into(),
                hint: "Set AVAILCAL_API_BASE_URL environment variable".into(),
            });
        }
        match Url::parse(&self.api_base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(ConfigError::Invalid {
                    field: "api_base_url".into(),
                    reason: format!("unsupported scheme {:?}", url.scheme()),
                });
            }
            Err(e) => {
                return Err(ConfigError::Invalid { field: "api_base_url".into(), reason: e.to_string() });
            }
        }

        if self.request_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.request_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if !(self.narrow_breakpoint.is_finite() && self.narrow_breakpoint > 0.0) {
            return Err(ConfigError::Invalid {
                field: "narrow_breakpoint".into(),
                reason: "must be a positive number".into(),
            });
        }

        if self.ready_retries == 0 {
            return Err(ConfigError::Invalid {
                field: "ready_retries".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.debounce_ms == 0 {
            tracing::warn!("debounce_ms is 0; every resize and navigation event triggers work immediately");
        }

        Ok(())
    }
}
