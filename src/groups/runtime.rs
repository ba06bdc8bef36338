//! Dyno runtime metrics (`log-runtime-metrics` lab feature)
//!
//! ```text
//! source=web.1 dyno=heroku.1234.abcd sample#load_avg_1m=0.01 sample#memory_rss=120.45MB sample#memory_pgpgin=4321pages
//! ```
//!
//! A dyno going down (`State changed from up to down`) evicts its series so
//! that stale gauges do not outlive the process.

use super::{Disposition, GroupSpec};
use crate::drain::record::{LogRecord, LogSource};
use crate::drain::value::Decoder;
use crate::metrics::binding::BindingSpec;

const BINDINGS: &[BindingSpec] = &[
    BindingSpec::gauge(
        "sample#load_avg_1m",
        "heroku_runtime_metrics_load_avg_1m",
        "The load average for the dyno in the last 1 minute. This reflects the number of CPU tasks that are in the ready queue (i.e. waiting to be processed).",
        Decoder::Number,
    ),
    BindingSpec::gauge(
        "sample#load_avg_5m",
        "heroku_runtime_metrics_load_avg_5m",
        "The load average for the dyno in the last 5 minutes. This reflects the number of CPU tasks that are in the ready queue (i.e. waiting to be processed).",
        Decoder::Number,
    ),
    BindingSpec::gauge(
        "sample#load_avg_15m",
        "heroku_runtime_metrics_load_avg_15m",
        "The load average for the dyno in the last 15 minutes. This reflects the number of CPU tasks that are in the ready queue (i.e. waiting to be processed).",
        Decoder::Number,
    ),
    BindingSpec::gauge(
        "sample#memory_total",
        "heroku_runtime_metrics_memory_total_bytes",
        "The total memory being used by the dyno, equal to the sum of resident, cache, and swap memory.",
        Decoder::Size,
    ),
    BindingSpec::gauge(
        "sample#memory_rss",
        "heroku_runtime_metrics_memory_rss_bytes",
        "The portion of the dyno’s memory held in RAM.",
        Decoder::Size,
    ),
    BindingSpec::gauge(
        "sample#memory_cache",
        "heroku_runtime_metrics_memory_cache_bytes",
        "The portion of the dyno’s memory used as disk cache.",
        Decoder::Size,
    ),
    BindingSpec::gauge(
        "sample#memory_swap",
        "heroku_runtime_metrics_memory_swap_bytes",
        "The portion of a dyno’s memory stored on disk.",
        Decoder::Size,
    ),
    BindingSpec::gauge(
        "sample#memory_quota",
        "heroku_runtime_metrics_memory_quota_bytes",
        "The resident memory (memory_rss) value at which an R14 is triggered.",
        Decoder::Size,
    ),
    BindingSpec::gauge(
        "sample#memory_pgpgin",
        "heroku_runtime_metrics_memory_pgpgin_pages",
        "The cumulative total of the pages written to disk. Sudden high variations on this number can indicate short duration spikes in swap usage. The other memory related metrics are point in time snapshots and can miss short spikes.",
        Decoder::Pages,
    ),
    BindingSpec::gauge(
        "sample#memory_pgpgout",
        "heroku_runtime_metrics_memory_pgpgout_pages",
        "The cumulative total of the pages read from disk. Sudden high variations on this number can indicate short duration spikes in swap usage. The other memory related metrics are point in time snapshots and can miss short spikes.",
        Decoder::Pages,
    ),
];

pub static SPEC: GroupSpec = GroupSpec {
    name: "runtime",
    label_names: &["app_name", "dyno", "dyno_id"],
    applies,
    labels,
    disposition,
    bindings: BINDINGS,
};

fn applies(record: &LogRecord) -> bool {
    let dyno = record.process_class();
    record.source() == &LogSource::Heroku
        && (dyno.starts_with("worker.") || dyno.starts_with("web."))
}

fn labels(record: &LogRecord) -> Vec<String> {
    vec![
        record.app_name().to_string(),
        record.process_class().to_string(),
        record.value_or_unknown("source").to_string(),
    ]
}

/// State changes carry no samples; only a change to `down` evicts
fn disposition(record: &LogRecord) -> Disposition {
    let body = record.body();
    if !body.starts_with("State changed") {
        return Disposition::Update;
    }

    if body.ends_with("to down") {
        Disposition::Evict
    } else {
        Disposition::Ignore
    }
}
