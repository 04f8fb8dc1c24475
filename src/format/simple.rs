//! Plain console layout.
//!
//! `timestamp [LEVEL] file:line Class@hash [logger] - message`, with data as
//! `key=value` pairs on the next line and error / stack trace on further
//! lines.

use crate::clock::TimeDisplay;
use crate::record::LogRecord;
use crate::span::{SpanKind, SpanTree};
use crate::term::TerminalCapabilities;

use super::{
    Formatter, SPAN_RECORD_SEPARATOR, SpanBasedFormatter, SpanTransformer,
    effective_time_display, format_span_based, push_time_spans,
};

pub struct SimpleConsoleFormatter {
    caps: TerminalCapabilities,
    time_display: TimeDisplay,
    show_location: bool,
    transformers: Vec<Box<dyn SpanTransformer>>,
}

impl SimpleConsoleFormatter {
    pub fn new(caps: TerminalCapabilities) -> Self {
        SimpleConsoleFormatter {
            caps,
            time_display: TimeDisplay::Auto,
            show_location: true,
            transformers: Vec::new(),
        }
    }

    pub fn time_display(mut self, display: TimeDisplay) -> Self {
        self.time_display = display;
        self
    }

    pub fn show_location(mut self, show: bool) -> Self {
        self.show_location = show;
        self
    }

    pub fn add_transformer(mut self, transformer: impl SpanTransformer + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }
}

impl SpanBasedFormatter for SimpleConsoleFormatter {
    fn build_span(&self, record: &LogRecord) -> SpanTree {
        let mut tree = SpanTree::sequence();
        let root = tree.root();

        let display = effective_time_display(record, self.time_display);
        push_time_spans(&mut tree, root, display, record);
        if !tree.children(root).is_empty() {
            tree.add_child(root, SpanKind::Whitespace);
        }

        tree.add_child(root, SpanKind::BracketedLevel(record.level.clone()));

        if self.show_location {
            if let Some(caller) = record.caller_info() {
                tree.add_child(root, SpanKind::Whitespace);
                tree.add_child(
                    root,
                    SpanKind::SourceLocation(caller.file.clone(), caller.line),
                );
            }
        }

        if let Some(instance) = &record.instance {
            tree.add_child(root, SpanKind::Whitespace);
            tree.add_child(
                root,
                SpanKind::ClassName(instance.type_name().to_string(), Some(instance.hash())),
            );
        }

        if let Some(name) = &record.logger_name {
            tree.add_child(root, SpanKind::Whitespace);
            let brackets = tree.add_child(
                root,
                SpanKind::Surrounded {
                    prefix: Some("[".into()),
                    suffix: Some("]".into()),
                },
            );
            tree.add_child(brackets, SpanKind::LoggerName(name.clone()));
        }

        tree.add_text(root, " - ");
        tree.add_child(
            root,
            SpanKind::LogMessage(record.message_text().unwrap_or_default().to_string()),
        );

        if !record.data.is_empty() {
            tree.add_child(root, SpanKind::NewLine);
            tree.add_text(root, "  ");
            tree.add_child(root, SpanKind::KeyValueData(record.data.clone()));
        }
        if let Some(error) = &record.error {
            tree.add_child(root, SpanKind::NewLine);
            tree.add_text(root, "  error: ");
            tree.add_child(root, SpanKind::ErrorSpan(error.clone()));
        }
        if let Some(trace) = &record.stack_trace {
            tree.add_child(root, SpanKind::NewLine);
            tree.add_child(root, SpanKind::StackTraceSpan(trace.clone()));
        }
        tree
    }

    fn transformers(&self) -> &[Box<dyn SpanTransformer>] {
        &self.transformers
    }

    fn capabilities(&self) -> TerminalCapabilities {
        self.caps
    }

    fn requires_caller_info(&self) -> bool {
        self.show_location
    }
}

impl Formatter for SimpleConsoleFormatter {
    fn requires_caller_info(&self) -> bool {
        SpanBasedFormatter::requires_caller_info(self)
    }

    fn record_separator(&self) -> &'static [u8] {
        SPAN_RECORD_SEPARATOR
    }

    fn format(&self, record: &LogRecord, out: &mut Vec<u8>) -> crate::error::Result<()> {
        format_span_based(self, record, out)
    }
}
