//! Configuration loading and representation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cashbook_ledger::MAX_ATTACHMENT_BYTES;
use cashbook_observability::LogFormat;

pub const ENV_MAX_ATTACHMENT_BYTES: &str = "CASHBOOK_MAX_ATTACHMENT_BYTES";
pub const ENV_STATS_TTL_SECS: &str = "CASHBOOK_STATS_TTL_SECS";
pub const ENV_PAGE_SIZE: &str = "CASHBOOK_PAGE_SIZE";
pub const ENV_MAX_PAGE_SIZE: &str = "CASHBOOK_MAX_PAGE_SIZE";
pub const ENV_LOG_FORMAT: &str = "CASHBOOK_LOG_FORMAT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Runtime settings of the ledger subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Upper bound (inclusive) for a single receipt file.
    pub max_attachment_bytes: usize,
    /// Lifetime of a cached ledger summary when no mutation invalidates it.
    pub stats_ttl_secs: u64,
    /// Page size used when a listing does not ask for one.
    pub default_page_size: usize,
    /// Hard cap on any listing page.
    pub max_page_size: usize,
    pub log_format: LogFormat,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_attachment_bytes: MAX_ATTACHMENT_BYTES,
            stats_ttl_secs: 300,
            default_page_size: 20,
            max_page_size: 1000,
            log_format: LogFormat::default(),
        }
    }
}

impl LedgerConfig {
    /// Defaults overridden by `CASHBOOK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each known key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup(ENV_MAX_ATTACHMENT_BYTES) {
            config.max_attachment_bytes = parse_number(ENV_MAX_ATTACHMENT_BYTES, &v)?;
        }
        if let Some(v) = lookup(ENV_STATS_TTL_SECS) {
            config.stats_ttl_secs = parse_number(ENV_STATS_TTL_SECS, &v)?;
        }
        if let Some(v) = lookup(ENV_PAGE_SIZE) {
            config.default_page_size = parse_number(ENV_PAGE_SIZE, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_PAGE_SIZE) {
            config.max_page_size = parse_number(ENV_MAX_PAGE_SIZE, &v)?;
        }
        if let Some(v) = lookup(ENV_LOG_FORMAT) {
            config.log_format = v.parse().map_err(|e: cashbook_observability::UnknownLogFormat| {
                ConfigError::Invalid {
                    key: ENV_LOG_FORMAT,
                    value: v.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attachment_bytes == 0 {
            return Err(ConfigError::Inconsistent(
                "max_attachment_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_attachment_bytes > MAX_ATTACHMENT_BYTES {
            return Err(ConfigError::Inconsistent(format!(
                "max_attachment_bytes ({}) exceeds the receipt limit of {MAX_ATTACHMENT_BYTES} bytes",
                self.max_attachment_bytes
            )));
        }
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(ConfigError::Inconsistent(
                "page sizes must be greater than zero".to_string(),
            ));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::Inconsistent(format!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }

    pub fn stats_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_ttl_secs)
    }

    /// Clamp a requested page size into `1..=max_page_size`; zero means
    /// "use the default".
    pub fn page_size(&self, requested: usize) -> usize {
        if requested == 0 {
            self.default_page_size
        } else {
            requested.min(self.max_page_size)
        }
    }
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
