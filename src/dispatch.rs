//! Routing parsed drain lines into metric groups
//!
//! The dispatcher owns the registered groups and the exporter's own metrics.
//! It is shared by every request; concurrency is handled by the instruments,
//! so dispatching needs only `&self`.

use crate::drain::record::LogRecord;
use crate::error::RecordError;
use crate::groups::{self, Disposition, MetricGroup};
use crate::metrics::binding::UpdateError;
use crate::metrics::{ExporterMetrics, LineOutcome};
use serde::Serialize;
use std::sync::Arc;

/// What one record did to the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Groups whose predicate matched
    pub groups_matched: usize,
    /// Instrument updates applied
    pub updates: usize,
    /// Series removed by eviction
    pub deletions: usize,
}

/// Per-request summary returned to the drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Non-blank lines received
    pub lines: usize,
    pub processed: usize,
    pub malformed: usize,
}

/// Feeds records to every group, in registration order
pub struct Dispatcher {
    groups: Vec<MetricGroup>,
    metrics: Arc<ExporterMetrics>,
}

impl Dispatcher {
    pub fn new(groups: Vec<MetricGroup>, metrics: Arc<ExporterMetrics>) -> Self {
        Self { groups, metrics }
    }

    /// Register the six standard groups into the exporter's registry
    ///
    /// # Errors
    ///
    /// Returns an error if any instrument name is already taken.
    pub fn with_default_groups(metrics: Arc<ExporterMetrics>) -> prometheus::Result<Self> {
        let groups = groups::register_defaults(metrics.registry())?;
        Ok(Self::new(groups, metrics))
    }

    pub fn groups(&self) -> &[MetricGroup] {
        &self.groups
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.metrics
    }

    /// Apply one record to every group whose predicate matches
    ///
    /// Decode failures skip the affected binding only. They are counted and
    /// logged at debug level.
    pub fn dispatch(&self, record: &LogRecord) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for group in &self.groups {
            if !group.applies(record) {
                continue;
            }
            outcome.groups_matched += 1;

            let labels = group.labels(record);
            let label_values: Vec<&str> = labels.iter().map(String::as_str).collect();

            match group.disposition(record) {
                Disposition::Update => {
                    for binding in group.bindings() {
                        match binding.update(record, &label_values) {
                            Ok(true) => outcome.updates += 1,
                            Ok(false) => {}
                            Err(UpdateError::Decode(e)) => {
                                self.metrics.decode_failure(binding.name());
                                tracing::debug!(
                                    group = group.name(),
                                    metric = binding.name(),
                                    error = %e,
                                    "Skipping undecodable drain value"
                                );
                            }
                            Err(UpdateError::Registry(e)) => {
                                tracing::warn!(
                                    group = group.name(),
                                    metric = binding.name(),
                                    error = %e,
                                    "Failed to update metric"
                                );
                            }
                        }
                    }
                }
                Disposition::Evict => {
                    let deleted = group
                        .bindings()
                        .iter()
                        .filter(|binding| binding.delete(&label_values))
                        .count();
                    outcome.deletions += deleted;
                    self.metrics.eviction(group.name());

                    tracing::debug!(
                        group = group.name(),
                        labels = ?label_values,
                        deleted_series = deleted,
                        "Evicted metric series"
                    );
                }
                Disposition::Ignore => {}
            }
        }

        outcome
    }

    /// Parse and dispatch one raw line
    ///
    /// # Errors
    ///
    /// Returns the parse error for malformed lines; nothing is dispatched.
    pub fn dispatch_line(&self, app_name: &str, line: &str) -> Result<DispatchOutcome, RecordError> {
        let record = LogRecord::parse(app_name, line)?;
        Ok(self.dispatch(&record))
    }

    /// Process a newline-delimited drain body, strictly in line order
    ///
    /// Lines may end in `\n` or `\r\n`, and a trailing `\r` on the last line
    /// is dropped too. Blank lines are skipped. A malformed line is counted
    /// and logged, and processing carries on with the next one.
    pub fn ingest(&self, app_name: &str, body: &str) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, line) in body.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            report.lines += 1;

            match self.dispatch_line(app_name, line) {
                Ok(_) => {
                    report.processed += 1;
                    self.metrics.record_line(LineOutcome::Processed);
                }
                Err(e) => {
                    report.malformed += 1;
                    self.metrics.record_line(LineOutcome::Malformed);
                    tracing::warn!(
                        app_name = %app_name,
                        line_number = index + 1,
                        error = %e,
                        "Skipping malformed drain line"
                    );
                }
            }
        }

        tracing::debug!(
            app_name = %app_name,
            lines = report.lines,
            processed = report.processed,
            malformed = report.malformed,
            "Drain batch processed"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::instrument::Instrument;
    use crate::metrics::summary::SummaryVec;
    use prometheus::{GaugeVec, HistogramVec};

    const ROUTER_LINE: &str = "83 <158>1 2024-01-01T00:00:00+00:00 host heroku router - \
        at=info method=GET path=\"/\" host=demo.herokuapp.com fwd=\"1.2.3.4\" dyno=web.1 \
        connect=1ms service=42ms status=200 bytes=12 protocol=https";

    fn dispatcher() -> Dispatcher {
        let metrics = Arc::new(ExporterMetrics::new().unwrap());
        Dispatcher::with_default_groups(metrics).unwrap()
    }

    fn instrument<'a>(dispatcher: &'a Dispatcher, name: &str) -> &'a Instrument {
        dispatcher
            .groups()
            .iter()
            .flat_map(|g| g.bindings())
            .find(|b| b.name() == name)
            .map(|b| b.instrument())
            .unwrap_or_else(|| panic!("no binding named {name}"))
    }

    fn summary<'a>(dispatcher: &'a Dispatcher, name: &str) -> &'a SummaryVec {
        match instrument(dispatcher, name) {
            Instrument::Summary(s) => s,
            _ => panic!("{name} is not a summary"),
        }
    }

    fn histogram<'a>(dispatcher: &'a Dispatcher, name: &str) -> &'a HistogramVec {
        match instrument(dispatcher, name) {
            Instrument::Histogram(h) => h,
            _ => panic!("{name} is not a histogram"),
        }
    }

    fn gauge<'a>(dispatcher: &'a Dispatcher, name: &str) -> &'a GaugeVec {
        match instrument(dispatcher, name) {
            Instrument::Gauge(g) => g,
            _ => panic!("{name} is not a gauge"),
        }
    }

    const ROUTER_LABELS: [&str; 6] = ["demo", "web.1", "demo.herokuapp.com", "GET", "https", "200"];

    #[test]
    fn test_router_service_feeds_summary_and_histogram() {
        let d = dispatcher();
        let outcome = d.dispatch_line("demo", ROUTER_LINE).unwrap();

        assert_eq!(outcome.groups_matched, 1);
        assert_eq!(outcome.updates, 4);

        let (count, sum) = summary(&d, "heroku_router_service_duration_seconds")
            .sample(&ROUTER_LABELS)
            .unwrap();
        assert_eq!(count, 1);
        assert!((sum - 0.042).abs() < 1e-12);

        let h = histogram(&d, "heroku_router_service_duration_histogram_seconds")
            .with_label_values(&ROUTER_LABELS);
        assert_eq!(h.get_sample_count(), 1);
        assert!((h.get_sample_sum() - 0.042).abs() < 1e-12);
    }

    #[test]
    fn test_state_change_to_down_evicts_runtime_series() {
        let d = dispatcher();
        let labels = ["demo", "web.1", "UNKNOWN"];

        d.dispatch_line(
            "demo",
            "1 2 3 4 heroku web.1 - sample#load_avg_1m=0.5 sample#memory_rss=12MB",
        )
        .unwrap();
        let load = gauge(&d, "heroku_runtime_metrics_load_avg_1m");
        assert_eq!(load.with_label_values(&labels).get(), 0.5);

        let outcome = d
            .dispatch_line(
                "demo",
                "1 2 3 4 heroku web.1 - State changed from starting to down",
            )
            .unwrap();
        assert_eq!(outcome.updates, 0);
        assert_eq!(outcome.deletions, 2);
        assert_eq!(d.metrics().evictions_count("runtime"), 1);

        let rss = gauge(&d, "heroku_runtime_metrics_memory_rss_bytes");
        assert!(rss.remove_label_values(&labels).is_err(), "series should be gone");
        assert!(load.remove_label_values(&labels).is_err(), "series should be gone");
    }

    #[test]
    fn test_eviction_only_touches_matching_label_tuple() {
        let d = dispatcher();
        d.dispatch_line("demo", "1 2 3 4 heroku web.1 - sample#load_avg_1m=1")
            .unwrap();
        d.dispatch_line("demo", "1 2 3 4 heroku web.2 - sample#load_avg_1m=2")
            .unwrap();

        d.dispatch_line("demo", "1 2 3 4 heroku web.1 - State changed from up to down")
            .unwrap();

        let load = gauge(&d, "heroku_runtime_metrics_load_avg_1m");
        assert_eq!(load.with_label_values(&["demo", "web.2", "UNKNOWN"]).get(), 2.0);
    }

    #[test]
    fn test_down_state_change_evicts_despite_numeric_fields() {
        let d = dispatcher();
        let labels = ["demo", "web.1", "UNKNOWN"];
        d.dispatch_line("demo", "1 2 3 4 heroku web.1 - sample#load_avg_1m=0.5")
            .unwrap();

        let outcome = d
            .dispatch_line(
                "demo",
                "1 2 3 4 heroku web.1 - State changed sample#load_avg_1m=3 from up to down",
            )
            .unwrap();

        assert_eq!(outcome.updates, 0);
        assert!(outcome.deletions > 0);
        let load = gauge(&d, "heroku_runtime_metrics_load_avg_1m");
        assert!(load.remove_label_values(&labels).is_err(), "series should be gone");
    }

    #[test]
    fn test_trailing_carriage_return_on_last_line_still_evicts() {
        let d = dispatcher();
        let report = d.ingest(
            "demo",
            "1 2 3 4 heroku web.1 - sample#load_avg_1m=0.5\r\n\
             1 2 3 4 heroku web.1 - State changed from up to down\r",
        );

        assert_eq!(report.processed, 2);
        assert_eq!(d.metrics().evictions_count("runtime"), 1);
        let load = gauge(&d, "heroku_runtime_metrics_load_avg_1m");
        assert!(load.remove_label_values(&["demo", "web.1", "UNKNOWN"]).is_err());
    }

    #[test]
    fn test_pgbouncer_samples_feed_every_gauge() {
        let d = dispatcher();
        let outcome = d
            .dispatch_line(
                "demo",
                "1 2 3 4 app heroku-pgbouncer - source=DATABASE addon=pgbouncer-1 \
                 sample#client_active=10 sample#client_waiting=2 sample#server_active=5 \
                 sample#server_idle=3 sample#max_wait=0.5 sample#avg_query=0.01 \
                 sample#avg_recv=2048 sample#avg_sent=4096",
            )
            .unwrap();

        assert_eq!(outcome.groups_matched, 1);
        assert_eq!(outcome.updates, 8);

        let labels = ["demo", "DATABASE", "pgbouncer-1"];
        for (name, expected) in [
            ("heroku_pgbouncer_metrics_client_active_count", 10.0),
            ("heroku_pgbouncer_metrics_client_waiting_count", 2.0),
            ("heroku_pgbouncer_metrics_server_active_count", 5.0),
            ("heroku_pgbouncer_metrics_server_idle_count", 3.0),
            ("heroku_pgbouncer_metrics_max_wait_seconds", 0.5),
            ("heroku_pgbouncer_metrics_avg_query_seconds", 0.01),
            ("heroku_pgbouncer_metrics_avg_recv_bytes", 2048.0),
            ("heroku_pgbouncer_metrics_avg_sent_bytes", 4096.0),
        ] {
            assert_eq!(gauge(&d, name).with_label_values(&labels).get(), expected, "{name}");
        }
    }

    #[test]
    fn test_other_state_changes_are_ignored() {
        let d = dispatcher();
        let outcome = d
            .dispatch_line(
                "demo",
                "1 2 3 4 heroku web.1 - State changed from starting to up sample#load_avg_1m=3",
            )
            .unwrap();

        assert_eq!(outcome.groups_matched, 1);
        assert_eq!(outcome.updates, 0);
        assert_eq!(outcome.deletions, 0);
    }

    #[test]
    fn test_short_header_line_does_not_stop_batch() {
        let d = dispatcher();
        let body = format!("2 3 4 heroku router - service=5ms\n{ROUTER_LINE}\n");
        let report = d.ingest("demo", &body);

        assert_eq!(
            report,
            BatchReport {
                lines: 2,
                processed: 1,
                malformed: 1
            }
        );
        assert_eq!(d.metrics().lines_count(LineOutcome::Malformed), 1);
        assert_eq!(d.metrics().lines_count(LineOutcome::Processed), 1);
        assert!(
            summary(&d, "heroku_router_service_duration_seconds")
                .sample(&ROUTER_LABELS)
                .is_some()
        );
    }

    #[test]
    fn test_blank_lines_are_not_counted() {
        let d = dispatcher();
        let report = d.ingest("demo", "\n\n   \r\n");
        assert_eq!(report, BatchReport::default());
    }

    #[test]
    fn test_replayed_gauge_record_is_idempotent() {
        let d = dispatcher();
        let line = "1 2 3 4 heroku heroku-postgres - source=DATABASE addon=pg-1 sample#db_size=2MB";
        d.dispatch_line("demo", line).unwrap();
        d.dispatch_line("demo", line).unwrap();

        let db_size = gauge(&d, "heroku_postgres_metrics_db_size_bytes");
        assert_eq!(
            db_size.with_label_values(&["demo", "DATABASE", "pg-1"]).get(),
            2_097_152.0
        );
    }

    #[test]
    fn test_system_errors_accumulate() {
        let d = dispatcher();
        let line = "1 2 3 4 heroku web.1 - Error R14 (Memory quota exceeded)";
        d.dispatch_line("demo", line).unwrap();
        d.dispatch_line("demo", line).unwrap();

        let Instrument::Counter(errors) = instrument(&d, "heroku_system_errors_total") else {
            panic!("expected counter");
        };
        assert_eq!(errors.with_label_values(&["demo", "web.1", "R14"]).get(), 2.0);
    }

    #[test]
    fn test_undecodable_value_is_counted_and_skipped() {
        let d = dispatcher();
        let outcome = d
            .dispatch_line(
                "demo",
                "1 2 3 4 heroku router - dyno=web.1 host=h method=GET protocol=http status=200 service=slow connect=1ms",
            )
            .unwrap();

        assert_eq!(outcome.updates, 2, "only the connect bindings update");
        assert_eq!(d.metrics().decode_failures_count(), 2);
    }

    #[test]
    fn test_unmatched_record_is_dropped_quietly() {
        let d = dispatcher();
        let outcome = d
            .dispatch_line("demo", "1 2 3 4 app worker.1 - hello world")
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::default());
    }
}
