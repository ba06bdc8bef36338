//! Platform error events (`Error R14 (Memory quota exceeded)` and friends)

use super::{GroupSpec, always_update};
use crate::drain::record::{LogRecord, LogSource, UNKNOWN};
use crate::metrics::binding::BindingSpec;

const BINDINGS: &[BindingSpec] = &[BindingSpec::event_counter(
    "error",
    "heroku_system_errors_total",
    "Heroku errors.",
)];

pub static SPEC: GroupSpec = GroupSpec {
    name: "system",
    label_names: &["app_name", "dyno", "error"],
    applies,
    labels,
    disposition: always_update,
    bindings: BINDINGS,
};

fn applies(record: &LogRecord) -> bool {
    record.source() == &LogSource::Heroku && record.body().starts_with("Error ")
}

fn labels(record: &LogRecord) -> Vec<String> {
    vec![
        record.app_name().to_string(),
        record.process_class().to_string(),
        error_code(record.body()).to_string(),
    ]
}

/// Second space-separated token of the body (`R14` in `Error R14 (...)`)
fn error_code(body: &str) -> &str {
    body.splitn(3, ' ').nth(1).unwrap_or(UNKNOWN)
}
