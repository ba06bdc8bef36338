//! drainwatch - Prometheus exporter for Heroku log drains
//!
//! Heroku delivers application and platform logs to an HTTP drain as
//! batches of syslog lines. This crate parses those lines, matches them to
//! metric groups (router timings, dyno runtime samples, Postgres and
//! pgbouncer samples, rack-timeout timings, platform errors) and keeps the
//! resulting series in a Prometheus registry served on a scrape endpoint.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod drain;
pub mod error;
pub mod groups;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod telemetry;
