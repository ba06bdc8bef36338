//! Prometheus metrics for drainwatch
//!
//! One [`Registry`] holds everything exposed on the metrics endpoint: the
//! instruments fed from drain lines (see [`binding`]) and a handful of
//! counters describing the exporter itself.
//!
//! Metrics are exposed in Prometheus text format.

pub mod binding;
pub mod instrument;
pub mod summary;

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// What happened to one drain line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Parsed and offered to every group
    Processed,
    /// Rejected before dispatch (no delimiter, short header)
    Malformed,
}

impl LineOutcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            LineOutcome::Processed => "processed",
            LineOutcome::Malformed => "malformed",
        }
    }
}

/// Why a drain request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TokenMismatch,
    BadMethod,
}

impl RejectReason {
    /// Convert reason to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::TokenMismatch => "token_mismatch",
            RejectReason::BadMethod => "bad_method",
        }
    }
}

/// Shared metrics registry plus the exporter's own counters
///
/// Created once at startup and handed to the dispatcher and the HTTP
/// handlers. Cloning shares the same registry.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub registry: Arc<Registry>,
    log_lines: IntCounterVec,
    decode_failures: IntCounterVec,
    evictions: IntCounterVec,
    rejected_requests: IntCounterVec,
}

impl ExporterMetrics {
    /// Create a new instance backed by a fresh registry
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Create a new instance that registers into `registry`
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        // Counter: drain lines by outcome
        //
        // Cardinality: 2 outcomes = 2 time series
        let log_lines = IntCounterVec::new(
            Opts::new(
                "drainwatch_log_lines_total",
                "Total number of drain lines received, by outcome",
            ),
            &["outcome"],
        )?;

        // Counter: values that failed to decode, by target metric
        //
        // The update is skipped instead of writing 0, so a rising rate here
        // means gauges are going stale rather than wrong.
        let decode_failures = IntCounterVec::new(
            Opts::new(
                "drainwatch_decode_failures_total",
                "Total number of drain values that could not be decoded, by target metric",
            ),
            &["metric"],
        )?;

        // Counter: series evictions (dyno reported down), by group
        let evictions = IntCounterVec::new(
            Opts::new(
                "drainwatch_series_evictions_total",
                "Total number of eviction events that removed metric series, by group",
            ),
            &["group"],
        )?;

        // Counter: drain requests rejected at the HTTP boundary
        let rejected_requests = IntCounterVec::new(
            Opts::new(
                "drainwatch_rejected_requests_total",
                "Total number of drain requests rejected before processing, by reason",
            ),
            &["reason"],
        )?;

        registry.register(Box::new(log_lines.clone()))?;
        registry.register(Box::new(decode_failures.clone()))?;
        registry.register(Box::new(evictions.clone()))?;
        registry.register(Box::new(rejected_requests.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            log_lines,
            decode_failures,
            evictions,
            rejected_requests,
        })
    }

    /// Registry that drain instruments register into
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record the outcome of one drain line
    pub fn record_line(&self, outcome: LineOutcome) {
        self.log_lines.with_label_values(&[outcome.as_str()]).inc();
    }

    /// Number of lines seen with `outcome` since startup
    pub fn lines_count(&self, outcome: LineOutcome) -> u64 {
        self.log_lines.with_label_values(&[outcome.as_str()]).get()
    }

    /// Record a value that could not be decoded for `metric`
    pub fn decode_failure(&self, metric: &str) {
        self.decode_failures.with_label_values(&[metric]).inc();
    }

    /// Total decode failures across all metrics
    pub fn decode_failures_count(&self) -> u64 {
        let metric_families = self.registry.gather();
        metric_families
            .iter()
            .find(|mf| mf.name() == "drainwatch_decode_failures_total")
            .map(|mf| {
                mf.get_metric()
                    .iter()
                    .map(|m| m.counter.value.unwrap_or(0.0) as u64)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Record an eviction event for `group`
    pub fn eviction(&self, group: &str) {
        self.evictions.with_label_values(&[group]).inc();
    }

    /// Number of eviction events for `group` since startup
    pub fn evictions_count(&self, group: &str) -> u64 {
        self.evictions.with_label_values(&[group]).get()
    }

    /// Record a rejected drain request
    pub fn rejected_request(&self, reason: RejectReason) {
        self.rejected_requests
            .with_label_values(&[reason.as_str()])
            .inc();
    }

    /// Number of requests rejected for `reason` since startup
    pub fn rejected_requests_count(&self, reason: RejectReason) -> u64 {
        self.rejected_requests
            .with_label_values(&[reason.as_str()])
            .get()
    }

    /// Gather all metrics and encode them in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();

        encoder.encode(&metric_families, &mut buffer).map_err(|e| {
            let metric_names: Vec<_> = metric_families.iter().map(|mf| mf.name()).collect();

            tracing::error!(
                error = %e,
                metric_family_count = metric_count,
                metric_names = ?metric_names,
                "Prometheus text encoder failed"
            );

            prometheus::Error::Msg(format!(
                "Failed to encode {} metric families: {}",
                metric_count, e
            ))
        })?;

        String::from_utf8(buffer).map_err(|e| {
            let valid_up_to = e.utf8_error().valid_up_to();

            tracing::error!(
                invalid_byte_index = valid_up_to,
                "Prometheus encoder produced invalid UTF-8"
            );

            prometheus::Error::Msg(format!(
                "Failed to convert metrics to UTF-8 at byte {}: {}. \
                A drain value used as a label is probably not valid UTF-8.",
                valid_up_to, e
            ))
        })
    }
}
