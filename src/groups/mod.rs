//! Metric groups: which drain lines feed which instruments
//!
//! A group pairs an applicability test with a label rule and a table of
//! bindings. Groups are defined as static [`GroupSpec`] data, one module per
//! log family, and registered once at startup into a shared registry.

pub mod pgbouncer;
pub mod postgres;
pub mod rack_timeout;
pub mod router;
pub mod runtime;
pub mod system;

use crate::drain::record::LogRecord;
use crate::metrics::binding::{BindingSpec, MetricBinding};
use prometheus::Registry;

/// What an applicable group does with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Update every binding whose source is present
    Update,
    /// Delete every binding's series for the record's labels
    Evict,
    /// Neither update nor delete
    Ignore,
}

/// Static definition of a metric group
#[derive(Clone, Copy)]
pub struct GroupSpec {
    pub name: &'static str,
    pub label_names: &'static [&'static str],
    pub applies: fn(&LogRecord) -> bool,
    pub labels: fn(&LogRecord) -> Vec<String>,
    pub disposition: fn(&LogRecord) -> Disposition,
    pub bindings: &'static [BindingSpec],
}

/// Disposition for groups that never evict
pub fn always_update(_record: &LogRecord) -> Disposition {
    Disposition::Update
}

/// Groups in registration (and dispatch) order
pub fn default_specs() -> [&'static GroupSpec; 6] {
    [
        &system::SPEC,
        &runtime::SPEC,
        &router::SPEC,
        &postgres::SPEC,
        &pgbouncer::SPEC,
        &rack_timeout::SPEC,
    ]
}

/// A registered group with live bindings
#[derive(Clone)]
pub struct MetricGroup {
    spec: GroupSpec,
    bindings: Vec<MetricBinding>,
}

impl MetricGroup {
    /// Register every binding of `spec` into `registry`
    ///
    /// # Errors
    ///
    /// Returns an error if any instrument cannot be registered.
    pub fn register(spec: &GroupSpec, registry: &Registry) -> prometheus::Result<Self> {
        let bindings = spec
            .bindings
            .iter()
            .map(|binding| MetricBinding::register(binding, spec.label_names, registry))
            .collect::<prometheus::Result<Vec<_>>>()?;

        tracing::debug!(
            group = spec.name,
            binding_count = bindings.len(),
            "Registered metric group"
        );

        Ok(Self {
            spec: *spec,
            bindings,
        })
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn label_names(&self) -> &'static [&'static str] {
        self.spec.label_names
    }

    pub fn applies(&self, record: &LogRecord) -> bool {
        (self.spec.applies)(record)
    }

    pub fn labels(&self, record: &LogRecord) -> Vec<String> {
        (self.spec.labels)(record)
    }

    pub fn disposition(&self, record: &LogRecord) -> Disposition {
        (self.spec.disposition)(record)
    }

    pub fn bindings(&self) -> &[MetricBinding] {
        &self.bindings
    }
}

/// Register all six groups into `registry`, in dispatch order
///
/// # Errors
///
/// Returns an error if any instrument cannot be registered.
pub fn register_defaults(registry: &Registry) -> prometheus::Result<Vec<MetricGroup>> {
    default_specs()
        .into_iter()
        .map(|spec| MetricGroup::register(spec, registry))
        .collect()
}
