//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! across all LaserGate applications.
//!
//! # Usage
//!
//! ```rust,no_run
//! use lasergate_common::config::{ConfigError, ConfigLoader, LasergateConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = LasergateConfig::load(Path::new("lasergate.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::consts::*;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields shared across all LaserGate applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "laser-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Device ─────────────────────────────────────────────────────────

/// Serial link to the laser controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// tty device path.
    pub path: PathBuf,
    /// Line speed.
    pub baud_rate: u32,
    /// Upper bound on waiting for a reply line [ms].
    pub reply_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DEVICE_PATH),
            baud_rate: DEFAULT_BAUD_RATE,
            reply_timeout_ms: DEFAULT_REPLY_TIMEOUT_MS,
        }
    }
}

impl DeviceConfig {
    #[inline]
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// State machine timing and billing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Sleep between ticks [ms].
    pub poll_interval_ms: u64,
    /// Idle time before an open session is closed [s].
    pub activity_timeout_s: u64,
    /// Hold window absorbing odometer plateaus while firing [ms].
    pub debounce_ms: u64,
    /// Price per minute of firing.
    pub unit_price: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            activity_timeout_s: DEFAULT_ACTIVITY_TIMEOUT_S,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            unit_price: DEFAULT_UNIT_PRICE,
        }
    }
}

impl ControllerConfig {
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[inline]
    pub fn activity_timeout(&self) -> Duration {
        Duration::from_secs(self.activity_timeout_s)
    }

    #[inline]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// ─── Whitelist ──────────────────────────────────────────────────────

/// Whitelist cache file and reload cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhitelistConfig {
    /// Flat file, one credential per line.
    pub path: PathBuf,
    /// Reload cadence [s].
    pub refresh_interval_s: u64,
}

impl Default for WhitelistConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_WHITELIST_PATH),
            refresh_interval_s: DEFAULT_WHITELIST_REFRESH_S,
        }
    }
}

impl WhitelistConfig {
    #[inline]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_s)
    }
}

// ─── Reporting ──────────────────────────────────────────────────────

/// Remote usage reporting endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Access point identifier sent with every report.
    pub asset_id: String,
    /// Value of the `Authorization: Token <token>` header.
    pub token: String,
    /// Endpoint for admission attempts.
    pub attempts_url: String,
    /// Endpoint for completed cut records.
    pub sessions_url: String,
    /// Endpoint serving the whitelist (used by the sync tool).
    #[serde(default)]
    pub whitelist_url: Option<String>,
    /// HTTP request timeout [s].
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Outbound queue capacity; reports beyond it are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_S
}

fn default_queue_capacity() -> usize {
    DEFAULT_REPORT_QUEUE_CAPACITY
}

impl ReportingConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("asset_id", &self.asset_id),
            ("token", &self.token),
            ("attempts_url", &self.attempts_url),
            ("sessions_url", &self.sessions_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "reporting.{name} cannot be empty"
                )));
            }
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "reporting.queue_capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Top level ──────────────────────────────────────────────────────

/// Complete LaserGate configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LasergateConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub whitelist: WhitelistConfig,
    /// Absent ⇒ reports are discarded.
    #[serde(default)]
    pub reporting: Option<ReportingConfig>,
}

impl LasergateConfig {
    /// Validate all sections.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` on the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.device.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "device.path cannot be empty".to_string(),
            ));
        }
        if self.device.reply_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "device.reply_timeout_ms must be > 0".to_string(),
            ));
        }

        let c = &self.controller;
        if c.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "controller.poll_interval_ms must be > 0".to_string(),
            ));
        }
        if c.activity_timeout_s == 0 {
            return Err(ConfigError::ValidationError(
                "controller.activity_timeout_s must be > 0".to_string(),
            ));
        }
        if !c.unit_price.is_finite() || c.unit_price < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "controller.unit_price must be finite and >= 0 (got {})",
                c.unit_price
            )));
        }

        if self.whitelist.refresh_interval_s == 0 {
            return Err(ConfigError::ValidationError(
                "whitelist.refresh_interval_s must be > 0".to_string(),
            ));
        }

        if let Some(reporting) = &self.reporting {
            reporting.validate()?;
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
