//! Heroku connection pooler (pgbouncer) metrics

use super::postgres::addon_labels;
use super::{GroupSpec, always_update};
use crate::drain::record::{LogRecord, LogSource};
use crate::drain::value::Decoder;
use crate::metrics::binding::BindingSpec;

const BINDINGS: &[BindingSpec] = &[
    BindingSpec::gauge(
        "sample#client_active",
        "heroku_pgbouncer_metrics_client_active_count",
        "The number of client connections to the pooler that have an active server connection assignment.",
        Decoder::Number,
    ),
    BindingSpec::gauge(
        "sample#client_waiting",
        "heroku_pgbouncer_metrics_client_waiting_count",
        "The number of client connections to the pooler that are waiting for a server connection assignment.",
        Decoder::Number,
    ),
    BindingSpec::gauge(
        "sample#server_active",
        "heroku_pgbouncer_metrics_server_active_count",
        "The number of server connections that are currently assigned to a client connection.",
        Decoder::Number,
    ),
    BindingSpec::gauge(
        "sample#server_idle",
        "heroku_pgbouncer_metrics_server_idle_count",
        "The number of server connections that are not currently assigned to a client connection.",
        Decoder::Number,
    ),
    BindingSpec::gauge(
        "sample#max_wait",
        "heroku_pgbouncer_metrics_max_wait_seconds",
        "The longest wait time of any client currently waiting for a server connection assignment.",
        Decoder::Number,
    ),
    BindingSpec::gauge(
        "sample#avg_query",
        "heroku_pgbouncer_metrics_avg_query_seconds",
        "The average query time of all queries executed through pooled connections.",
        Decoder::Number,
    ),
    BindingSpec::gauge(
        "sample#avg_recv",
        "heroku_pgbouncer_metrics_avg_recv_bytes",
        "The average amount of bytes received from clients per second.",
        Decoder::Number,
    ),
    BindingSpec::gauge(
        "sample#avg_sent",
        "heroku_pgbouncer_metrics_avg_sent_bytes",
        "The average amount of bytes sent to clients per second.",
        Decoder::Number,
    ),
];

pub static SPEC: GroupSpec = GroupSpec {
    name: "pgbouncer",
    label_names: &["app_name", "source", "addon"],
    applies,
    labels: addon_labels,
    disposition: always_update,
    bindings: BINDINGS,
};

fn applies(record: &LogRecord) -> bool {
    record.source() == &LogSource::App && record.process_class() == "heroku-pgbouncer"
}
