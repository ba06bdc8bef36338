//! Label-addressed summary instrument
//!
//! The Prometheus client only ships counters, gauges and histograms, so
//! summaries are implemented here as a [`Collector`]. Each series keeps a
//! cumulative count and sum plus a sliding window of recent observations
//! from which the configured quantiles are computed at scrape time.

use prometheus::core::{Collector, Desc};
use prometheus::proto::{LabelPair, Metric, MetricFamily, MetricType, Quantile};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Quantiles reported for every summary series
pub const DEFAULT_OBJECTIVES: [f64; 6] = [0.01, 0.1, 0.5, 0.9, 0.95, 0.99];

/// How long an observation contributes to quantiles
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Upper bound on observations retained per series
pub const DEFAULT_MAX_SAMPLES: usize = 1024;

/// Options for [`SummaryVec`]
#[derive(Debug, Clone)]
pub struct SummaryOpts {
    pub name: String,
    pub help: String,
    pub objectives: Vec<f64>,
    pub max_age: Duration,
    pub max_samples: usize,
}

impl SummaryOpts {
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, help: S2) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            objectives: DEFAULT_OBJECTIVES.to_vec(),
            max_age: DEFAULT_MAX_AGE,
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples.max(1);
        self
    }
}

#[derive(Debug, Default)]
struct Series {
    count: u64,
    sum: f64,
    window: VecDeque<(Instant, f64)>,
}

impl Series {
    fn observe(&mut self, value: f64, now: Instant, opts: &SummaryOpts) {
        self.count += 1;
        self.sum += value;
        self.window.push_back((now, value));
        self.trim(now, opts);
    }

    fn trim(&mut self, now: Instant, opts: &SummaryOpts) {
        while self.window.len() > opts.max_samples {
            self.window.pop_front();
        }
        while let Some((at, _)) = self.window.front() {
            if now.saturating_duration_since(*at) <= opts.max_age {
                break;
            }
            self.window.pop_front();
        }
    }

    /// Nearest-rank quantiles over the current window, NaN when it is empty
    fn quantiles(&self, objectives: &[f64]) -> Vec<(f64, f64)> {
        let mut values: Vec<f64> = self.window.iter().map(|(_, v)| *v).collect();
        values.sort_by(f64::total_cmp);

        objectives
            .iter()
            .map(|&q| {
                if values.is_empty() {
                    return (q, f64::NAN);
                }
                let rank = (q * values.len() as f64).ceil() as usize;
                let index = rank.clamp(1, values.len()) - 1;
                (q, values[index])
            })
            .collect()
    }
}

/// A summary partitioned by label values
///
/// Cloning is cheap and every clone observes into the same series.
#[derive(Clone)]
pub struct SummaryVec {
    inner: Arc<SummaryCore>,
}

struct SummaryCore {
    desc: Desc,
    opts: SummaryOpts,
    label_names: Vec<String>,
    series: RwLock<HashMap<Vec<String>, Arc<Mutex<Series>>>>,
}

impl SummaryVec {
    /// Create a summary with the given variable label names
    ///
    /// # Errors
    ///
    /// Returns an error if the metric or label names are invalid.
    pub fn new(opts: SummaryOpts, label_names: &[&str]) -> prometheus::Result<Self> {
        let label_names: Vec<String> = label_names.iter().map(|l| l.to_string()).collect();
        let desc = Desc::new(
            opts.name.clone(),
            opts.help.clone(),
            label_names.clone(),
            HashMap::new(),
        )?;

        Ok(Self {
            inner: Arc::new(SummaryCore {
                desc,
                opts,
                label_names,
                series: RwLock::new(HashMap::new()),
            }),
        })
    }

    fn check_cardinality(&self, label_values: &[&str]) -> prometheus::Result<()> {
        let expect = self.inner.label_names.len();
        if label_values.len() != expect {
            return Err(prometheus::Error::Msg(format!(
                "summary {} expects {} label values, got {}",
                self.inner.opts.name,
                expect,
                label_values.len()
            )));
        }
        Ok(())
    }

    /// Record one observation for the series addressed by `label_values`
    ///
    /// # Errors
    ///
    /// Returns an error if the number of label values does not match.
    pub fn observe(&self, label_values: &[&str], value: f64) -> prometheus::Result<()> {
        self.check_cardinality(label_values)?;
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();

        let existing = self
            .inner
            .series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();

        let series = match existing {
            Some(series) => series,
            None => self
                .inner
                .series
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_default()
                .clone(),
        };

        series
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(value, Instant::now(), &self.inner.opts);
        Ok(())
    }

    /// Drop the series addressed by `label_values`
    ///
    /// # Errors
    ///
    /// Returns an error if the number of label values does not match or the
    /// series does not exist.
    pub fn remove_label_values(&self, label_values: &[&str]) -> prometheus::Result<()> {
        self.check_cardinality(label_values)?;
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();

        match self
            .inner
            .series
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
        {
            Some(_) => Ok(()),
            None => Err(prometheus::Error::Msg(format!(
                "missing label values {:?} in summary {}",
                label_values, self.inner.opts.name
            ))),
        }
    }

    /// Cumulative `(count, sum)` of a series, if it exists
    pub fn sample(&self, label_values: &[&str]) -> Option<(u64, f64)> {
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        let map = self
            .inner
            .series
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let series = map.get(&key)?.lock().unwrap_or_else(PoisonError::into_inner);
        Some((series.count, series.sum))
    }

    fn metric(&self, label_values: &[String], series: &Mutex<Series>) -> Metric {
        let mut series = series.lock().unwrap_or_else(PoisonError::into_inner);
        series.trim(Instant::now(), &self.inner.opts);

        let mut summary = prometheus::proto::Summary::default();
        summary.set_sample_count(series.count);
        summary.set_sample_sum(series.sum);
        summary.quantile = series
            .quantiles(&self.inner.opts.objectives)
            .into_iter()
            .map(|(q, v)| {
                let mut quantile = Quantile::default();
                quantile.set_quantile(q);
                quantile.set_value(v);
                quantile
            })
            .collect();

        // Sorted by label name, like the built-in vectors
        let mut pairs: Vec<_> = self.inner.label_names.iter().zip(label_values).collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));

        let mut metric = Metric::default();
        metric.label = pairs
            .into_iter()
            .map(|(name, value)| {
                let mut pair = LabelPair::default();
                pair.set_name(name.clone());
                pair.set_value(value.clone());
                pair
            })
            .collect();
        metric.set_summary(summary);
        metric
    }
}

impl Collector for SummaryVec {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.inner.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let map = self
            .inner
            .series
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if map.is_empty() {
            return Vec::new();
        }

        let mut entries: Vec<_> = map.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut family = MetricFamily::default();
        family.set_name(self.inner.opts.name.clone());
        family.set_help(self.inner.opts.help.clone());
        family.set_field_type(MetricType::SUMMARY);
        family.metric = entries
            .into_iter()
            .map(|(values, series)| self.metric(values, series))
            .collect();

        vec![family]
    }
}
