//! Writers: terminal sinks for records.
//!
//! A writer accepts formatted records synchronously and owns whatever I/O
//! state that takes. Errors raised while writing never propagate to the
//! application; they are routed to the writer's own error handler, which by
//! default emits a diagnostic line to stderr.

pub mod reader;
pub mod rotating;

use std::io::Write as _;

use crate::error::{Result, TreelogError};
use crate::format::Formatter;
use crate::record::LogRecord;

/// Terminal sink contract.
///
/// `flush` drains durable state and `close` flushes and releases resources;
/// both block until background work has landed. `close` is terminal: records
/// written afterwards may be dropped.
pub trait Writer: Send + Sync {
    /// Whether this writer's formatter (or the writer itself) needs records
    /// to carry a caller token.
    fn requires_caller_info(&self) -> bool {
        false
    }

    /// Synchronous dispatch of one record. Must never panic; I/O failures go
    /// through [`Writer::handle_error`]. The only error surfaced to callers
    /// is a persistent path-resolution failure.
    fn write(&self, record: &LogRecord) -> Result<()>;

    fn flush(&self) -> Result<()>;

    fn close(&self) -> Result<()>;

    /// Failure reporting channel for this writer. Never panics.
    fn handle_error(&self, error: &TreelogError) {
        eprintln!("treelog: {error}");
    }
}

/// Callback invoked with failures a writer swallowed.
pub type ErrorHandler = Box<dyn Fn(&TreelogError) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

/// Formats records and prints them to stdout or stderr.
pub struct ConsoleWriter {
    target: ConsoleTarget,
    formatter: Box<dyn Formatter>,
}

impl ConsoleWriter {
    pub fn new(formatter: impl Formatter + 'static) -> Self {
        ConsoleWriter {
            target: ConsoleTarget::Stdout,
            formatter: Box::new(formatter),
        }
    }

    pub fn stderr(formatter: impl Formatter + 'static) -> Self {
        ConsoleWriter {
            target: ConsoleTarget::Stderr,
            formatter: Box::new(formatter),
        }
    }
}

impl Writer for ConsoleWriter {
    fn requires_caller_info(&self) -> bool {
        self.formatter.requires_caller_info()
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let mut bytes = Vec::with_capacity(128);
        self.formatter.format(record, &mut bytes)?;
        bytes.extend_from_slice(self.formatter.record_separator());
        match self.target {
            ConsoleTarget::Stdout => std::io::stdout().lock().write_all(&bytes)?,
            ConsoleTarget::Stderr => std::io::stderr().lock().write_all(&bytes)?,
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        match self.target {
            ConsoleTarget::Stdout => std::io::stdout().lock().flush()?,
            ConsoleTarget::Stderr => std::io::stderr().lock().flush()?,
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.flush()
    }
}
