//! # Treelog - Hierarchical Structured Logging
//!
//! Treelog is a structured logging library built around a composable logger
//! tree, a span-based console rendering engine, and a rotating file sink.
//!
//! ## Architecture
//!
//! The library is organized into focused modules:
//! - `logger`: the logger hierarchy, record pipeline and process-wide root
//! - `record`: the immutable log record, lazy messages, instance markers
//! - `span`: the mutable rendering tree and its color-stack renderer
//! - `format`: span-based, compact and JSON formatters
//! - `writer`: the writer contract, console writer, rotating file writer
//!   and the rotated-set reader/tail
//! - `intercept`: synchronous record transformers (redaction, enrichment,
//!   sampling)
//! - `caller`: lazy caller-site resolution from captured backtraces
//!
//! ## Features
//!
//! - Parent/child loggers with context merging and per-logger level gates
//! - Lazy messages and lazy caller-info capture, paid for only when used
//! - Declarative span trees with transformer hooks and terminal-aware
//!   ANSI rendering (16 / 256 / truecolor with CIE76 down-sampling)
//! - Rotating file storage with size/time rotation, retention, background
//!   gzip compression and synchronous or buffered flushing
//! - Chronological multi-file reads with tail-and-follow
//!
//! ## Example
//!
//! ```rust,no_run
//! use treelog::{ChildOptions, LogOptions};
//!
//! let root = treelog::root();
//! let request = root.child(ChildOptions::new().name("request"));
//! request.add_context("request_id", "R-17");
//! request.info("accepted");
//! request.log(
//!     treelog::LogLevel::WARNING,
//!     "slow upstream",
//!     LogOptions::new().field("elapsed_ms", 2150),
//! );
//! ```

pub mod caller;
pub mod clock;
pub mod error;
pub mod format;
pub mod intercept;
pub mod level;
pub mod logger;
pub mod record;
pub mod span;
pub mod term;
pub mod writer;

pub use error::{Result, TreelogError};
pub use level::LogLevel;
pub use logger::{
    ChildOptions, LogOptions, Logger, critical, debug, error, info, log, notice, root, set_root,
    success, trace, warning, wtf,
};
pub use record::{Data, FormatOption, InstanceMarker, LogRecord, Message};

/// The types most consumers need.
pub mod prelude {
    pub use crate::clock::TimeDisplay;
    pub use crate::format::compact::CompactFormatter;
    pub use crate::format::json::JsonFormatter;
    pub use crate::format::rainbow::{RainbowFormatOptions, RainbowFormatter};
    pub use crate::format::simple::SimpleConsoleFormatter;
    pub use crate::level::LogLevel;
    pub use crate::logger::{ChildOptions, LogOptions, Logger};
    pub use crate::record::{Data, Message};
    pub use crate::term::{ColorSupport, TerminalCapabilities};
    pub use crate::writer::reader::RotatingFileReader;
    pub use crate::writer::rotating::{
        FileRotationConfig, FlushStrategy, RotatingFileWriter, RotationInterval,
    };
    pub use crate::writer::{ConsoleWriter, Writer};
}

#[cfg(test)]
mod tests;
