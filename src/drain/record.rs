//! Log drain record parsing
//!
//! A drain line looks like
//!
//! ```text
//! 83 <40>1 2012-11-30T06:45:29+00:00 host heroku web.3 - State changed from starting to up
//! ```
//!
//! Six space-separated header tokens, a literal `" - "` delimiter, then a
//! free-text body. The body's `key=value` tokens are only split out when a
//! caller first asks for them.

use crate::error::RecordError;
use std::collections::HashMap;
use std::sync::OnceLock;

/// App name used when the drain URL does not carry one
pub const UNKNOWN: &str = "UNKNOWN";

const BODY_DELIMITER: &str = " - ";
const HEADER_TOKENS: usize = 6;

/// Origin of a drain line, taken from the fifth header token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSource {
    /// Platform-emitted lines (router, runtime metrics, errors, Postgres)
    Heroku,
    /// Lines written by the application or an add-on running beside it
    App,
    /// Anything else, kept verbatim
    Other(String),
}

impl LogSource {
    fn from_token(token: &str) -> Self {
        match token {
            "heroku" => LogSource::Heroku,
            "app" => LogSource::App,
            other => LogSource::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LogSource::Heroku => "heroku",
            LogSource::App => "app",
            LogSource::Other(other) => other,
        }
    }
}

/// One parsed drain line
///
/// Header fields are fixed at construction. The key/value view of the body
/// is computed at most once, on first access, and is safe to read from
/// several threads.
#[derive(Debug)]
pub struct LogRecord {
    app_name: String,
    log_version: String,
    priority: String,
    timestamp: String,
    hostname: String,
    source: LogSource,
    process_class: String,
    body: String,
    key_values: OnceLock<HashMap<String, String>>,
}

impl LogRecord {
    /// Parse a raw drain line for `app_name`
    ///
    /// An empty `app_name` becomes [`UNKNOWN`]. When the header carries more
    /// than six tokens, the six closest to the delimiter are used.
    ///
    /// # Errors
    ///
    /// - [`RecordError::MissingDelimiter`] if the line has no `" - "`
    /// - [`RecordError::ShortHeader`] if fewer than six header tokens precede it
    pub fn parse(app_name: &str, line: &str) -> Result<Self, RecordError> {
        let (header, body) = line
            .split_once(BODY_DELIMITER)
            .ok_or(RecordError::MissingDelimiter)?;

        let tokens: Vec<&str> = header.split(' ').collect();
        if tokens.len() < HEADER_TOKENS {
            return Err(RecordError::ShortHeader {
                found: tokens.len(),
            });
        }
        let tokens = &tokens[tokens.len() - HEADER_TOKENS..];

        let app_name = if app_name.is_empty() {
            UNKNOWN
        } else {
            app_name
        };

        Ok(Self {
            app_name: app_name.to_string(),
            log_version: tokens[0].to_string(),
            priority: tokens[1].to_string(),
            timestamp: tokens[2].to_string(),
            hostname: tokens[3].to_string(),
            source: LogSource::from_token(tokens[4]),
            process_class: tokens[5].to_string(),
            body: body.to_string(),
            key_values: OnceLock::new(),
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn log_version(&self) -> &str {
        &self.log_version
    }

    pub fn priority(&self) -> &str {
        &self.priority
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn source(&self) -> &LogSource {
        &self.source
    }

    /// Process or dyno identifier (`router`, `web.1`, `heroku-postgres`, ...)
    pub fn process_class(&self) -> &str {
        &self.process_class
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// `key=value` pairs found in the body, parsed on first call
    pub fn key_values(&self) -> &HashMap<String, String> {
        self.key_values.get_or_init(|| parse_key_values(&self.body))
    }

    /// Look up a body value by key
    pub fn value(&self, key: &str) -> Option<&str> {
        self.key_values().get(key).map(String::as_str)
    }

    /// Look up a body value by key, falling back to [`UNKNOWN`]
    pub fn value_or_unknown(&self, key: &str) -> &str {
        self.value(key).unwrap_or(UNKNOWN)
    }
}

/// Split a body into its `key=value` tokens
///
/// Tokens without `=` are skipped and later duplicates overwrite earlier
/// ones. The value stops at a second `=`, so `a=b=c` yields `a` → `b`.
fn parse_key_values(body: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for token in body.split(' ').filter(|t| t.contains('=')) {
        let mut parts = token.split('=');
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();
        values.insert(key.to_string(), value.to_string());
    }

    values
}
