//! Declarative bindings from drain values to instruments
//!
//! A [`BindingSpec`] is plain data: which body key to read, which decoder to
//! run on it and which instrument receives the result. Groups hold tables of
//! specs and turn them into live [`MetricBinding`]s at registration time.

use super::instrument::{Instrument, InstrumentKind};
use crate::drain::record::LogRecord;
use crate::drain::value::Decoder;
use crate::error::RecordError;
use prometheus::Registry;
use thiserror::Error;

/// Where a binding takes its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Fires when the body carries this key, with its value
    Key(&'static str),
    /// Fires every time the group applies; used for event counters
    Event(&'static str),
}

impl Source {
    /// Name used to address the binding (`service`, `sample#load_avg_1m`, `error`)
    pub fn name(&self) -> &'static str {
        match self {
            Source::Key(key) | Source::Event(key) => key,
        }
    }
}

/// Static description of one binding
#[derive(Debug, Clone, Copy)]
pub struct BindingSpec {
    pub source: Source,
    pub name: &'static str,
    pub help: &'static str,
    pub kind: InstrumentKind,
    pub decoder: Decoder,
    pub buckets: Option<&'static [f64]>,
}

impl BindingSpec {
    pub const fn gauge(
        key: &'static str,
        name: &'static str,
        help: &'static str,
        decoder: Decoder,
    ) -> Self {
        Self {
            source: Source::Key(key),
            name,
            help,
            kind: InstrumentKind::Gauge,
            decoder,
            buckets: None,
        }
    }

    pub const fn summary(
        key: &'static str,
        name: &'static str,
        help: &'static str,
        decoder: Decoder,
    ) -> Self {
        Self {
            source: Source::Key(key),
            name,
            help,
            kind: InstrumentKind::Summary,
            decoder,
            buckets: None,
        }
    }

    pub const fn histogram(
        key: &'static str,
        name: &'static str,
        help: &'static str,
        decoder: Decoder,
        buckets: Option<&'static [f64]>,
    ) -> Self {
        Self {
            source: Source::Key(key),
            name,
            help,
            kind: InstrumentKind::Histogram,
            decoder,
            buckets,
        }
    }

    pub const fn event_counter(event: &'static str, name: &'static str, help: &'static str) -> Self {
        Self {
            source: Source::Event(event),
            name,
            help,
            kind: InstrumentKind::Counter,
            decoder: Decoder::Number,
            buckets: None,
        }
    }
}

/// Why a binding could not update its instrument
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Decode(#[from] RecordError),

    #[error(transparent)]
    Registry(#[from] prometheus::Error),
}

/// A registered binding: a spec with its live instrument
#[derive(Clone)]
pub struct MetricBinding {
    source: Source,
    name: &'static str,
    decoder: Decoder,
    instrument: Instrument,
}

impl MetricBinding {
    /// Create the binding's instrument in `registry`
    ///
    /// # Errors
    ///
    /// Returns an error if the instrument cannot be registered.
    pub fn register(
        spec: &BindingSpec,
        label_names: &[&str],
        registry: &Registry,
    ) -> prometheus::Result<Self> {
        let instrument = Instrument::register(
            registry,
            spec.kind,
            spec.name,
            spec.help,
            label_names,
            spec.buckets,
        )?;

        Ok(Self {
            source: spec.source,
            name: spec.name,
            decoder: spec.decoder,
            instrument,
        })
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Instrument (metric family) name
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Feed `record` into the instrument under `label_values`
    ///
    /// Returns `Ok(false)` when the record does not carry the bound key.
    /// Counters never decode; any other kind skips the update when the value
    /// fails to decode.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Decode`] for undecodable values and
    /// [`UpdateError::Registry`] for label cardinality mismatches.
    pub fn update(&self, record: &LogRecord, label_values: &[&str]) -> Result<bool, UpdateError> {
        let raw = match self.source {
            Source::Key(key) => match record.value(key) {
                Some(raw) => Some(raw),
                None => return Ok(false),
            },
            Source::Event(_) => None,
        };

        let value = match (self.instrument.kind(), raw) {
            (InstrumentKind::Counter, _) | (_, None) => 1.0,
            (_, Some(raw)) => self.decoder.decode(raw)?,
        };

        self.instrument.update(label_values, value)?;
        Ok(true)
    }

    /// Remove the series for `label_values`; `false` if there was none
    pub fn delete(&self, label_values: &[&str]) -> bool {
        self.instrument.delete(label_values)
    }
}
