//! Command-line interface for drainwatch
//!
//! Provides argument parsing and subcommand handling for the drainwatch binary.

use crate::config::Config;
use clap::{Parser, Subcommand};

/// Prometheus exporter for Heroku log drains
#[derive(Parser)]
#[command(name = "drainwatch")]
#[command(version)]
#[command(about = "Prometheus exporter for Heroku log drains")]
#[command(
    long_about = "drainwatch accepts Heroku log-drain batches over HTTP, turns router, \
    runtime, Postgres, pgbouncer, rack-timeout and platform error lines into metrics, \
    and exposes them for Prometheus to scrape."
)]
pub struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Settings that take precedence over the configuration file
#[derive(clap::Args, Debug, Default)]
pub struct Overrides {
    /// IP address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Path Prometheus scrapes
    #[arg(long)]
    pub metrics_path: Option<String>,

    /// Path the log drain posts to
    #[arg(long)]
    pub logs_path: Option<String>,

    /// Query parameter carrying the drain token
    #[arg(long)]
    pub token_param_name: Option<String>,

    /// Expected drain token (empty disables the check)
    #[arg(long)]
    pub token_param_value: Option<String>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Overrides {
    /// Copy every flag that was given into `config`
    pub fn apply(&self, config: &mut Config) {
        let Self {
            host,
            port,
            metrics_path,
            logs_path,
            token_param_name,
            token_param_value,
            log_level,
        } = self;

        if let Some(host) = host {
            config.server.host = host.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
        if let Some(path) = metrics_path {
            config.server.metrics_path = path.clone();
        }
        if let Some(path) = logs_path {
            config.server.logs_path = path.clone();
        }
        if let Some(name) = token_param_name {
            config.drain.token_param_name = name.clone();
        }
        if let Some(value) = token_param_value {
            config.drain.token_param_value = value.clone();
        }
        if let Some(level) = log_level {
            config.observability.log_level = level.clone();
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# drainwatch configuration
#
# Every setting below shows its default. Any section or key may be left out,
# and each one can also be overridden on the command line.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 9841

# Prometheus scrape path (GET)
metrics_path = "/metrics"

# Log drain path (POST). Point the drain at
#   https://<host>/logs?app_name=<app>&token=<secret>
logs_path = "/logs"

# ─────────────────────────────────────────────────────────────────────────────
# DRAIN AUTHENTICATION
# ─────────────────────────────────────────────────────────────────────────────

[drain]
# Query parameter that carries the shared secret
token_param_name = "token"

# Expected secret. Leave empty to accept every batch.
token_param_value = ""

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
# RUST_LOG, when set, takes precedence.
log_level = "info"
"#
}
