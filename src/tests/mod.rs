//! Cross-module tests: pipeline behavior, file rotation, reading back, and
//! span-tree formatting.

mod rotation_tests;
mod span_tests;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::format::Formatter;
use crate::level::LogLevel;
use crate::record::{Data, LogRecord};
use crate::writer::Writer;

/// Captures every record it receives, for assertions on the assembled
/// record rather than on formatted bytes.
pub(crate) struct CollectingWriter {
    records: Arc<Mutex<Vec<LogRecord>>>,
    requires_caller: bool,
}

impl CollectingWriter {
    pub fn new() -> (Self, Arc<Mutex<Vec<LogRecord>>>) {
        let records = Arc::new(Mutex::new(Vec::new()));
        (
            CollectingWriter {
                records: Arc::clone(&records),
                requires_caller: false,
            },
            records,
        )
    }

    pub fn requiring_caller() -> (Self, Arc<Mutex<Vec<LogRecord>>>) {
        let (mut writer, records) = Self::new();
        writer.requires_caller = true;
        (writer, records)
    }
}

impl Writer for CollectingWriter {
    fn requires_caller_info(&self) -> bool {
        self.requires_caller
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Always fails; failures land in `handled` through `handle_error`.
pub(crate) struct FailingWriter {
    pub handled: Arc<Mutex<Vec<String>>>,
}

impl FailingWriter {
    pub fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let handled = Arc::new(Mutex::new(Vec::new()));
        (
            FailingWriter {
                handled: Arc::clone(&handled),
            },
            handled,
        )
    }
}

impl Writer for FailingWriter {
    fn write(&self, _record: &LogRecord) -> Result<()> {
        Err(std::io::Error::other("sink is broken").into())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn handle_error(&self, error: &crate::TreelogError) {
        self.handled.lock().push(error.to_string());
    }
}

/// Minimal formatter for file-layer tests: the bare message, one per line.
pub(crate) struct LineFormatter;

impl Formatter for LineFormatter {
    fn format(&self, record: &LogRecord, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(record.message_text().unwrap_or_default().as_bytes());
        Ok(())
    }
}

pub(crate) fn record(level: LogLevel, message: &str) -> LogRecord {
    LogRecord {
        timestamp: chrono::Utc::now(),
        level,
        message: Some(message.into()),
        data: Data::new(),
        error: None,
        stack_trace: None,
        logger_name: None,
        instance: None,
        caller: None,
        format_options: Vec::new(),
    }
}
