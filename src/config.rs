//! Configuration management for drainwatch
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section is optional; a missing file section takes its defaults.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;

/// Log levels accepted by `observability.log_level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub drain: DrainConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Listener and HTTP paths
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Where Prometheus scrapes
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    /// Where the log drain posts batches
    #[serde(default = "default_logs_path")]
    pub logs_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            metrics_path: default_metrics_path(),
            logs_path: default_logs_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9841
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_logs_path() -> String {
    "/logs".to_string()
}

/// Shared-secret check on the drain URL
///
/// The drain is configured with a URL such as
/// `https://exporter/logs?app_name=shop&token=s3cret`. The check is active
/// only when both the parameter name and the expected value are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DrainConfig {
    #[serde(default = "default_token_param_name")]
    pub token_param_name: String,
    #[serde(default)]
    pub token_param_value: String,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            token_param_name: default_token_param_name(),
            token_param_value: String::new(),
        }
    }
}

fn default_token_param_name() -> String {
    "token".to_string()
}

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();
        let config = Self::read_file(path)?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Read and parse a TOML file without validating it
    ///
    /// Used when command-line overrides still have to be applied; call
    /// [`Config::validate`] afterwards.
    pub fn read_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
            path: path_display,
            source,
        })
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()` and `from_str()`.
    pub fn validate(&self) -> AppResult<()> {
        self.server.host.parse::<IpAddr>().map_err(|_| {
            AppError::Config(format!(
                "server.host '{}' is not an IP address",
                self.server.host
            ))
        })?;

        for (field, path) in [
            ("server.metrics_path", &self.server.metrics_path),
            ("server.logs_path", &self.server.logs_path),
        ] {
            if !path.starts_with('/') {
                return Err(AppError::Config(format!(
                    "{field} '{path}' must start with '/'"
                )));
            }
            if path == "/" {
                return Err(AppError::Config(format!(
                    "{field} must not be '/', which serves the health check"
                )));
            }
        }

        if self.server.metrics_path == self.server.logs_path {
            return Err(AppError::Config(format!(
                "server.metrics_path and server.logs_path are both '{}'",
                self.server.logs_path
            )));
        }

        let level = self.observability.log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(AppError::Config(format!(
                "observability.log_level '{}' is not one of {}",
                self.observability.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Query parameter name and expected value, when the token check is on
    pub fn token_check(&self) -> Option<(&str, &str)> {
        let name = self.drain.token_param_name.as_str();
        let value = self.drain.token_param_value.as_str();
        if name.is_empty() || value.is_empty() {
            None
        } else {
            Some((name, value))
        }
    }

    /// Address the HTTP server binds to
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        let ip = self.server.host.parse::<IpAddr>().map_err(|_| {
            AppError::Config(format!(
                "server.host '{}' is not an IP address",
                self.server.host
            ))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
