//! rack-timeout completion lines written by Ruby web dynos

use super::{GroupSpec, always_update};
use crate::drain::record::{LogRecord, LogSource};
use crate::drain::value::Decoder;
use crate::metrics::binding::BindingSpec;

const BINDINGS: &[BindingSpec] = &[
    BindingSpec::summary(
        "wait",
        "heroku_rack_timeout_wait_duration_seconds",
        "Request wait duration reported by rack-timeout as summary.",
        Decoder::Millis,
    ),
    BindingSpec::summary(
        "service",
        "heroku_rack_timeout_service_duration_seconds",
        "Request service duration reported by rack-timeout as summary.",
        Decoder::Millis,
    ),
    BindingSpec::histogram(
        "wait",
        "heroku_rack_timeout_wait_duration_histogram_seconds",
        "Request wait duration reported by rack-timeout as histogram.",
        Decoder::Millis,
        None,
    ),
    BindingSpec::histogram(
        "service",
        "heroku_rack_timeout_service_duration_histogram_seconds",
        "Request service duration reported by rack-timeout as histogram.",
        Decoder::Millis,
        None,
    ),
];

pub static SPEC: GroupSpec = GroupSpec {
    name: "rack_timeout",
    label_names: &["app_name", "dyno"],
    applies,
    labels,
    disposition: always_update,
    bindings: BINDINGS,
};

fn applies(record: &LogRecord) -> bool {
    record.source() == &LogSource::App
        && record.process_class().starts_with("web.")
        && record.body().contains("source=rack-timeout")
        && record.body().contains("state=completed")
}

fn labels(record: &LogRecord) -> Vec<String> {
    vec![
        record.app_name().to_string(),
        record.process_class().to_string(),
    ]
}
