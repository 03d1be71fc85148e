//! Configuration structures for SockFeed

use crate::types::{LogLevel, MessageFormat};
use crate::{Result, SockFeedError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Collector hostname or IP address
    pub host: String,
    /// Collector TCP port
    pub port: u16,
    /// Delay between sends, in seconds
    pub interval: f64,
    /// Wire encoding of each message
    pub format: MessageFormat,
    /// Template text embedded in every message
    pub message: String,
    /// Level label written into JSON bodies
    pub level: LogLevel,
    /// Stop after this many messages; run until interrupted when unset
    pub count: Option<u64>,
    /// Upper bound on the connect call, in seconds; unbounded when unset
    pub connect_timeout: Option<f64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8888,
            interval: 1.0,
            format: MessageFormat::Text,
            message: "Test message from socket client".to_string(),
            level: LogLevel::Info,
            count: None,
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Load and validate configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::parse_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file without validating it, for layering overrides on top
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SockFeedError::Config(format!("Failed to read config file: {}", e)))?;

        let config: ClientConfig = toml::from_str(&content)
            .map_err(|e| SockFeedError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(SockFeedError::Config("Host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(SockFeedError::Config("Port must be between 1 and 65535".to_string()));
        }
        if !self.interval.is_finite() || self.interval < 0.0 {
            return Err(SockFeedError::Config(format!(
                "Interval must be a non-negative number of seconds, got {}",
                self.interval
            )));
        }
        if Duration::try_from_secs_f64(self.interval).is_err() {
            return Err(SockFeedError::Config(format!("Interval {} is too large", self.interval)));
        }
        if self.count == Some(0) {
            return Err(SockFeedError::Config("Count must be at least 1".to_string()));
        }
        if let Some(secs) = self.connect_timeout {
            if !secs.is_finite() || secs <= 0.0 || Duration::try_from_secs_f64(secs).is_err() {
                return Err(SockFeedError::Config(format!(
                    "Connect timeout must be a positive number of seconds, got {}",
                    secs
                )));
            }
        }
        Ok(())
    }

    /// `host:port` as shown to the user
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Delay between sends
    pub fn interval_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval).unwrap_or(Duration::ZERO)
    }

    /// Connect timeout, if one is configured
    pub fn connect_timeout_duration(&self) -> Option<Duration> {
        self.connect_timeout
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}
