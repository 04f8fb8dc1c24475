//! Record interceptors.
//!
//! Interceptors run on the logger's synchronous path, strictly before
//! writers, in registration order root-first. Each one may pass the record
//! through, return a replacement, or drop it by returning `Ok(None)`. They
//! must be fast; blocking in an interceptor is a programmer error.

use serde_json::Value;

use crate::error::Result;
use crate::record::{Data, LogRecord, stable_hash};

pub trait Interceptor: Send + Sync {
    /// Whether records fed to this interceptor should carry a caller token.
    fn requires_caller_info(&self) -> bool {
        false
    }

    /// `Ok(Some)` forwards a (possibly replaced) record, `Ok(None)` drops
    /// it. An `Err` also drops the record and is reported as a diagnostic.
    fn intercept(&self, record: LogRecord) -> Result<Option<LogRecord>>;
}

/// Replaces the values of configured keys with `"<redacted>"`, including in
/// nested maps.
pub struct RedactFields {
    keys: Vec<String>,
}

impl RedactFields {
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        RedactFields {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    fn redact(&self, data: &mut Data) {
        for (key, value) in data.iter_mut() {
            if self.keys.iter().any(|k| k == key) {
                *value = Value::String("<redacted>".into());
            } else if let Value::Object(nested) = value {
                self.redact(nested);
            }
        }
    }
}

impl Interceptor for RedactFields {
    fn intercept(&self, mut record: LogRecord) -> Result<Option<LogRecord>> {
        self.redact(&mut record.data);
        Ok(Some(record))
    }
}

/// Adds process-scoped fields to every record. Existing keys are not
/// overwritten: call-site data wins.
pub struct EnrichFields {
    fields: Data,
}

impl EnrichFields {
    pub fn new(fields: Data) -> Self {
        EnrichFields { fields }
    }
}

impl Interceptor for EnrichFields {
    fn intercept(&self, mut record: LogRecord) -> Result<Option<LogRecord>> {
        for (key, value) in &self.fields {
            if !record.data.contains_key(key) {
                record.data.insert(key.clone(), value.clone());
            }
        }
        Ok(Some(record))
    }
}

/// Keeps roughly one in `n` records, selected by a stable hash of the
/// message body so a given message is either always kept or always dropped.
pub struct SampleByHash {
    keep_one_in: u64,
}

impl SampleByHash {
    pub fn new(keep_one_in: u64) -> Self {
        SampleByHash {
            keep_one_in: keep_one_in.max(1),
        }
    }
}

impl Interceptor for SampleByHash {
    fn intercept(&self, record: LogRecord) -> Result<Option<LogRecord>> {
        let subject = record.message_text().unwrap_or_default();
        if stable_hash(subject.as_bytes()) % self.keep_one_in == 0 {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }
}
