//! Pool configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Environment variable holding the pool capacity.
pub const ENV_CAPACITY: &str = "POOL_CAPACITY";
/// Environment variable holding the wait timeout in milliseconds.
pub const ENV_WAIT_TIMEOUT_MS: &str = "POOL_WAIT_TIMEOUT_MS";
/// Environment variable enabling usage reports.
pub const ENV_REPORT_USAGE: &str = "POOL_REPORT_USAGE";

const DEFAULT_WAIT_TIMEOUT_MS: u64 = 60_000;

const fn default_wait_timeout_ms() -> u64 {
    DEFAULT_WAIT_TIMEOUT_MS
}

/// Pool configuration.
///
/// ```
/// use prometheus_resource_pool::config::PoolConfig;
/// use std::time::Duration;
///
/// let config = PoolConfig::new(10)
///     .with_wait_timeout(Duration::from_secs(5))
///     .with_report_usage(true);
///
/// assert_eq!(config.capacity, 10);
/// assert_eq!(config.wait_timeout(), Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of resources outstanding at once.
    pub capacity: usize,
    /// Default time `acquire` waits for a free slot, in milliseconds.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    /// Log active/idle counts after every acquire and recycle.
    #[serde(default)]
    pub report_usage: bool,
}

impl PoolConfig {
    /// Configuration with the given capacity and a 60 second wait timeout.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            report_usage: false,
        }
    }

    /// Set the default wait timeout.
    ///
    /// Stored in whole milliseconds, rounded up so a non-zero timeout never
    /// becomes a zero one. Zero means "take a free slot or fail at once".
    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        let mut millis = timeout.as_millis();
        if timeout.subsec_nanos() % 1_000_000 != 0 {
            millis += 1;
        }
        self.wait_timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    /// Enable or disable usage reports.
    #[must_use]
    pub const fn with_report_usage(mut self, enabled: bool) -> Self {
        self.report_usage = enabled;
        self
    }

    /// Default wait timeout as a `Duration`.
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Validate pool configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse pool configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message on malformed JSON or invalid values.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the environment, reading `.env` first.
    ///
    /// `POOL_CAPACITY` is required; `POOL_WAIT_TIMEOUT_MS` and
    /// `POOL_REPORT_USAGE` are optional.
    ///
    /// # Errors
    ///
    /// Fails if a variable is missing, unparsable, or the result is invalid.
    pub fn from_env() -> AppResult<Self> {
        // A missing .env file is fine; real environment variables still apply.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// As for [`from_env`](Self::from_env).
    pub fn from_lookup<L>(lookup: L) -> AppResult<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let capacity = lookup(ENV_CAPACITY)
            .with_context(|| format!("{ENV_CAPACITY} is not set"))?
            .trim()
            .parse::<usize>()
            .with_context(|| format!("{ENV_CAPACITY} is not a valid integer"))?;

        let wait_timeout_ms = match lookup(ENV_WAIT_TIMEOUT_MS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_WAIT_TIMEOUT_MS} is not a valid integer"))?,
            None => DEFAULT_WAIT_TIMEOUT_MS,
        };

        let report_usage = match lookup(ENV_REPORT_USAGE) {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("{ENV_REPORT_USAGE} must be true/false"))?,
            None => false,
        };

        let cfg = Self {
            capacity,
            wait_timeout_ms,
            report_usage,
        };
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration for several named pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolsConfig {
    /// Map of pool name to configuration.
    pub pools: HashMap<String, PoolConfig>,
}

impl PoolsConfig {
    /// Validate all pools and ensure at least one pool exists.
    ///
    /// # Errors
    ///
    /// Names the first invalid pool.
    pub fn validate(&self) -> Result<(), String> {
        if self.pools.is_empty() {
            return Err("at least one pool must be defined".into());
        }
        for (name, pool) in &self.pools {
            pool.validate()
                .map_err(|e| format!("pool `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse multi-pool configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message on malformed JSON or invalid values.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
