//! Metric instruments behind a single update/delete contract
//!
//! Every binding drives exactly one instrument. The closed set of kinds keeps
//! dispatch a plain `match`.

use super::summary::{SummaryOpts, SummaryVec};
use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};

/// Buckets used by histograms that do not specify their own
pub const DEFAULT_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.02, 0.04, 0.06, 0.08, 0.1, 0.125, 0.15, 0.175, 0.2, 0.3, 0.4, 0.5, 1.0, 2.5,
    5.0, 10.0, 15.0, 20.0,
];

/// Kind of metric primitive a binding feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentKind {
    Counter,
    Gauge,
    Summary,
    Histogram,
}

impl InstrumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentKind::Counter => "counter",
            InstrumentKind::Gauge => "gauge",
            InstrumentKind::Summary => "summary",
            InstrumentKind::Histogram => "histogram",
        }
    }
}

/// A label-addressed metric primitive
#[derive(Clone)]
pub enum Instrument {
    Counter(CounterVec),
    Gauge(GaugeVec),
    Summary(SummaryVec),
    Histogram(HistogramVec),
}

impl Instrument {
    /// Build an instrument and register it with `registry`
    ///
    /// `buckets` only applies to histograms; `None` means [`DEFAULT_BUCKETS`].
    ///
    /// # Errors
    ///
    /// Returns an error if the name or labels are invalid, or the name is
    /// already registered.
    pub fn register(
        registry: &Registry,
        kind: InstrumentKind,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: Option<&[f64]>,
    ) -> prometheus::Result<Self> {
        let instrument = match kind {
            InstrumentKind::Counter => {
                Instrument::Counter(CounterVec::new(Opts::new(name, help), label_names)?)
            }
            InstrumentKind::Gauge => {
                Instrument::Gauge(GaugeVec::new(Opts::new(name, help), label_names)?)
            }
            InstrumentKind::Summary => {
                Instrument::Summary(SummaryVec::new(SummaryOpts::new(name, help), label_names)?)
            }
            InstrumentKind::Histogram => Instrument::Histogram(HistogramVec::new(
                HistogramOpts::new(name, help)
                    .buckets(buckets.unwrap_or(DEFAULT_BUCKETS).to_vec()),
                label_names,
            )?),
        };

        match &instrument {
            Instrument::Counter(m) => registry.register(Box::new(m.clone()))?,
            Instrument::Gauge(m) => registry.register(Box::new(m.clone()))?,
            Instrument::Summary(m) => registry.register(Box::new(m.clone()))?,
            Instrument::Histogram(m) => registry.register(Box::new(m.clone()))?,
        }

        Ok(instrument)
    }

    pub fn kind(&self) -> InstrumentKind {
        match self {
            Instrument::Counter(_) => InstrumentKind::Counter,
            Instrument::Gauge(_) => InstrumentKind::Gauge,
            Instrument::Summary(_) => InstrumentKind::Summary,
            Instrument::Histogram(_) => InstrumentKind::Histogram,
        }
    }

    /// Apply `value` to the series for `label_values`
    ///
    /// Counters ignore `value` and increment by one; gauges are set;
    /// summaries and histograms observe.
    ///
    /// # Errors
    ///
    /// Returns an error if the label cardinality does not match.
    pub fn update(&self, label_values: &[&str], value: f64) -> prometheus::Result<()> {
        match self {
            Instrument::Counter(m) => m.get_metric_with_label_values(label_values)?.inc(),
            Instrument::Gauge(m) => m.get_metric_with_label_values(label_values)?.set(value),
            Instrument::Summary(m) => m.observe(label_values, value)?,
            Instrument::Histogram(m) => m
                .get_metric_with_label_values(label_values)?
                .observe(value),
        }
        Ok(())
    }

    /// Remove the series for `label_values`
    ///
    /// Returns `false` when no such series existed.
    pub fn delete(&self, label_values: &[&str]) -> bool {
        let result = match self {
            Instrument::Counter(m) => m.remove_label_values(label_values),
            Instrument::Gauge(m) => m.remove_label_values(label_values),
            Instrument::Summary(m) => m.remove_label_values(label_values),
            Instrument::Histogram(m) => m.remove_label_values(label_values),
        };
        result.is_ok()
    }
}
