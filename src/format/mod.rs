//! Formatters turn records into bytes.
//!
//! [`Formatter`] is the writer-facing contract. Console-oriented formatters
//! implement [`SpanBasedFormatter`] and route their `format` through
//! [`format_span_based`]: build a span tree, run the registered
//! [`SpanTransformer`]s over it in registration order, render for the sink's
//! terminal capabilities.

pub mod compact;
pub mod json;
pub mod rainbow;
pub mod simple;

use chrono::Utc;

use crate::clock::TimeDisplay;
use crate::error::Result;
use crate::record::LogRecord;
use crate::span::render::render_to_string;
use crate::span::{SpanId, SpanKind, SpanTree};
use crate::term::TerminalCapabilities;

/// Serializes records for a writer.
pub trait Formatter: Send + Sync {
    /// Whether records fed to this formatter should carry a caller token.
    fn requires_caller_info(&self) -> bool {
        false
    }

    /// Byte sequence terminating one serialized record. Formatters whose
    /// output may itself contain newlines declare `\x1E\n` (ASCII Record
    /// Separator + newline) so readers can split unambiguously while files
    /// stay editor-readable.
    fn record_separator(&self) -> &'static [u8] {
        b"\n"
    }

    fn format(&self, record: &LogRecord, out: &mut Vec<u8>) -> Result<()>;
}

/// A hook that mutates a span tree before rendering. Transformers compose by
/// mutation and run on the logger's synchronous path, so they must not block
/// on I/O.
pub trait SpanTransformer: Send + Sync {
    fn transform(&self, tree: &mut SpanTree, record: &LogRecord);
}

impl<F> SpanTransformer for F
where
    F: Fn(&mut SpanTree, &LogRecord) + Send + Sync,
{
    fn transform(&self, tree: &mut SpanTree, record: &LogRecord) {
        self(tree, record)
    }
}

/// A formatter whose layout is a span tree.
pub trait SpanBasedFormatter: Send + Sync {
    /// Layout subclass responsibility: the tree for one record.
    fn build_span(&self, record: &LogRecord) -> SpanTree;

    /// Transformers applied in registration order, each mutating the tree.
    fn transformers(&self) -> &[Box<dyn SpanTransformer>] {
        &[]
    }

    /// Capabilities of the sink this formatter renders for.
    fn capabilities(&self) -> TerminalCapabilities;

    fn requires_caller_info(&self) -> bool {
        false
    }
}

/// Record separator for span layouts: they put stack traces and multi-line
/// data on their own lines, so a bare newline cannot frame records.
pub const SPAN_RECORD_SEPARATOR: &[u8] = b"\x1e\n";

/// The shared `format` body for span-based formatters: build, transform in
/// registration order, render.
pub fn format_span_based<T: SpanBasedFormatter + ?Sized>(
    formatter: &T,
    record: &LogRecord,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mut tree = formatter.build_span(record);
    for transformer in formatter.transformers() {
        transformer.transform(&mut tree, record);
    }
    out.extend_from_slice(render_to_string(&tree, &formatter.capabilities()).as_bytes());
    Ok(())
}

/// Appends timestamp spans for `display` under `parent`. Which instant(s)
/// appear is decided by [`TimeDisplay::instants`]; the primary and bracketed
/// secondary are distinct spans so a transformer can find and remove either.
pub(crate) fn push_time_spans(
    tree: &mut SpanTree,
    parent: SpanId,
    display: TimeDisplay,
    record: &LogRecord,
) {
    let Some((primary, bracketed)) = display.instants(record.timestamp, Utc::now()) else {
        return;
    };
    tree.add_child(parent, SpanKind::Timestamp(primary));
    if let Some(secondary) = bracketed {
        tree.add_text(parent, " [");
        tree.add_child(parent, SpanKind::Timestamp(secondary));
        tree.add_text(parent, "]");
    }
}

/// The [`TimeDisplay`] in effect for a record: the per-call override when
/// present, otherwise the formatter's default.
pub(crate) fn effective_time_display(record: &LogRecord, fallback: TimeDisplay) -> TimeDisplay {
    record.time_display().unwrap_or(fallback)
}
