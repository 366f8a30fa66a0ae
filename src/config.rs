//! Configuration for paymentsvc.

use crate::application::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Service configuration, loadable from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Log filter directive (e.g. `info`, `paymentsvc=debug`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// RocksDB directory. In-memory storage when absent.
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Cleanup sweeper configuration.
    #[serde(default)]
    pub sweeper: SweeperConfig,

    /// Read cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Cleanup sweeper configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Seconds between sweeps.
    #[serde(default = "default_sweep_interval")]
    pub interval_secs: u64,

    /// Age in seconds after which a pending payment is failed.
    #[serde(default = "default_pending_timeout")]
    pub pending_timeout_secs: u64,

    /// Fire on wall-clock multiples of the interval (top of the hour by default).
    #[serde(default = "default_true")]
    pub align_to_interval: bool,
}

/// Read cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of cached reads.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            db_path: None,
            sweeper: SweeperConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval(),
            pending_timeout_secs: default_pending_timeout(),
            align_to_interval: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_cache_capacity(),
        }
    }
}

impl SweeperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn pending_timeout(&self) -> Duration {
        Duration::from_secs(self.pending_timeout_secs)
    }

    /// Creation time before which a payment pending at `now` counts as stale.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Config` when the timeout reaches past the
    /// representable date range.
    pub fn pending_cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        chrono::Duration::from_std(self.pending_timeout())
            .ok()
            .and_then(|timeout| now.checked_sub_signed(timeout))
            .ok_or_else(|| {
                PaymentError::Config(format!(
                    "pending_timeout_secs {} is out of range",
                    self.pending_timeout_secs
                ))
            })
    }
}

impl CacheConfig {
    /// Capacity to build the cache with; zero when disabled.
    pub fn effective_capacity(&self) -> usize {
        if self.enabled { self.capacity } else { 0 }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_sweep_interval() -> u64 {
    3600 // hourly
}

const fn default_pending_timeout() -> u64 {
    2 * 3600
}

const fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

const fn default_true() -> bool {
    true
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it fails
    /// `validate`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| PaymentError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the sweeper could never act on.
    pub fn validate(&self) -> Result<()> {
        self.sweeper.pending_cutoff(Utc::now())?;
        Ok(())
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| PaymentError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
