//! JSON lines formatter.
//!
//! One JSON object per record, LF-terminated by the writer's separator.
//! Field order is canonical: `timestamp, level, message, logger?, data?,
//! error?, stack_trace?`. Serialization is deterministic: the data map keeps
//! insertion order and values are plain `serde_json::Value`s.

use chrono::SecondsFormat;
use serde::Serialize;

use crate::error::{Result, TreelogError};
use crate::record::{Data, LogRecord};

use super::Formatter;

/// Wire shape of one record. Struct field order is serialization order.
#[derive(Serialize)]
struct JsonRecord<'a> {
    /// ISO 8601 with milliseconds and offset.
    timestamp: String,
    level: &'a str,
    /// Always present; `null` for message-less records.
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logger: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Data>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack_trace: Option<&'a str>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        JsonFormatter
    }
}

impl Formatter for JsonFormatter {
    fn record_separator(&self) -> &'static [u8] {
        b"\n"
    }

    fn format(&self, record: &LogRecord, out: &mut Vec<u8>) -> Result<()> {
        let wire = JsonRecord {
            timestamp: record
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, false),
            level: record.level.name(),
            message: record.message_text(),
            logger: record.logger_name.as_deref(),
            data: (!record.data.is_empty()).then_some(&record.data),
            error: record.error.as_deref(),
            stack_trace: record.stack_trace.as_deref(),
        };
        let line = serde_json::to_vec(&wire).map_err(|e| TreelogError::Formatter(e.to_string()))?;
        out.extend_from_slice(&line);
        Ok(())
    }
}
