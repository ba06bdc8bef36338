//! Heroku router request lines
//!
//! ```text
//! at=info method=GET path=/ host=app.herokuapp.com dyno=web.1 connect=1ms service=18ms status=200 protocol=https
//! ```
//!
//! Both durations are recorded as a summary and as a histogram.

use super::{GroupSpec, always_update};
use crate::drain::record::{LogRecord, LogSource};
use crate::drain::value::Decoder;
use crate::metrics::binding::BindingSpec;

const CONNECT_BUCKETS: &[f64] = &[
    0.001, 0.002, 0.003, 0.004, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0,
];

const BINDINGS: &[BindingSpec] = &[
    BindingSpec::summary(
        "service",
        "heroku_router_service_duration_seconds",
        "Request service duration reported by Heroku Router as summary.",
        Decoder::Millis,
    ),
    BindingSpec::summary(
        "connect",
        "heroku_router_connect_duration_seconds",
        "Request connect duration reported by Heroku Router as summary.",
        Decoder::Millis,
    ),
    BindingSpec::histogram(
        "service",
        "heroku_router_service_duration_histogram_seconds",
        "Request service duration reported by Heroku Router as histogram.",
        Decoder::Millis,
        None,
    ),
    BindingSpec::histogram(
        "connect",
        "heroku_router_connect_duration_histogram_seconds",
        "Request connect duration reported by Heroku Router as histogram.",
        Decoder::Millis,
        Some(CONNECT_BUCKETS),
    ),
];

pub static SPEC: GroupSpec = GroupSpec {
    name: "router",
    label_names: &["app_name", "dyno", "host", "method", "protocol", "status"],
    applies,
    labels,
    disposition: always_update,
    bindings: BINDINGS,
};

fn applies(record: &LogRecord) -> bool {
    record.source() == &LogSource::Heroku && record.process_class() == "router"
}

fn labels(record: &LogRecord) -> Vec<String> {
    let mut labels = vec![record.app_name().to_string()];
    labels.extend(
        ["dyno", "host", "method", "protocol", "status"]
            .into_iter()
            .map(|key| record.value_or_unknown(key).to_string()),
    );
    labels
}
