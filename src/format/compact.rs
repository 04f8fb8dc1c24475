//! Single-line compact layout: `HH:MM:SS.mmm <Class@hash> <message> (k: v, …)`
//! with error and stack trace on subsequent lines.

use crate::clock::TimeDisplay;
use crate::record::LogRecord;
use crate::span::{SpanKind, SpanTree};
use crate::term::TerminalCapabilities;

use super::{
    Formatter, SPAN_RECORD_SEPARATOR, SpanBasedFormatter, SpanTransformer,
    effective_time_display, format_span_based, push_time_spans,
};

pub struct CompactFormatter {
    caps: TerminalCapabilities,
    time_display: TimeDisplay,
    transformers: Vec<Box<dyn SpanTransformer>>,
}

impl CompactFormatter {
    pub fn new(caps: TerminalCapabilities) -> Self {
        CompactFormatter {
            caps,
            time_display: TimeDisplay::Auto,
            transformers: Vec::new(),
        }
    }

    pub fn time_display(mut self, display: TimeDisplay) -> Self {
        self.time_display = display;
        self
    }

    pub fn add_transformer(mut self, transformer: impl SpanTransformer + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }
}

impl SpanBasedFormatter for CompactFormatter {
    fn build_span(&self, record: &LogRecord) -> SpanTree {
        let mut tree = SpanTree::sequence();
        let root = tree.root();

        let display = effective_time_display(record, self.time_display);
        push_time_spans(&mut tree, root, display, record);
        if !tree.children(root).is_empty() {
            tree.add_child(root, SpanKind::Whitespace);
        }

        if let Some(instance) = &record.instance {
            tree.add_child(
                root,
                SpanKind::ClassName(instance.type_name().to_string(), Some(instance.hash())),
            );
            tree.add_child(root, SpanKind::Whitespace);
        }

        tree.add_child(
            root,
            SpanKind::LogMessage(record.message_text().unwrap_or_default().to_string()),
        );

        if !record.data.is_empty() {
            tree.add_child(root, SpanKind::Whitespace);
            tree.add_child(root, SpanKind::InlineData(record.data.clone()));
        }
        if let Some(error) = &record.error {
            tree.add_child(root, SpanKind::NewLine);
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
}

impl Formatter for CompactFormatter {
    fn record_separator(&self) -> &'static [u8] {
        SPAN_RECORD_SEPARATOR
    }

    fn format(&self, record: &LogRecord, out: &mut Vec<u8>) -> crate::error::Result<()> {
        format_span_based(self, record, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Formatter;
    use crate::level::LogLevel;
    use crate::record::{Data, InstanceMarker};
    use chrono::TimeZone;

    #[test]
    fn one_line_with_instance_and_data() {
        struct Session;
        let session = Session;
        let mut data = Data::new();
        data.insert("user".into(), serde_json::json!("ada"));
        data.insert("attempts".into(), serde_json::json!(2));
        let record = LogRecord {
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 59).unwrap(),
            level: LogLevel::DEBUG,
            message: Some("login ok".into()),
            data,
            error: None,
            stack_trace: None,
            logger_name: None,
            instance: Some(InstanceMarker::of(&session)),
            caller: None,
            format_options: Vec::new(),
        };

        let formatter =
            CompactFormatter::new(TerminalCapabilities::none()).time_display(TimeDisplay::Clock);
        let mut out = Vec::new();
        formatter.format(&record, &mut out).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert!(line.starts_with("23:59:59.000 Session@"));
        assert!(line.ends_with("login ok (user: ada, attempts: 2)"));
        assert!(!line.contains('\n'));
    }
}
