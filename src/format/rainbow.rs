//! Rich colored console layout.
//!
//! Identity fields (logger, class, method) are colored by a stable hash over
//! a curated readable palette, so the same entity keeps its hue across runs.
//! The level gates the message color: red for error and above, amber for
//! warning.

use crate::clock::TimeDisplay;
use crate::level::LogLevel;
use crate::record::{LogRecord, stable_hash};
use crate::span::style::{Color, Style};
use crate::span::{SpanId, SpanKind, SpanTree};
use crate::term::TerminalCapabilities;

use super::{
    Formatter, SPAN_RECORD_SEPARATOR, SpanBasedFormatter, SpanTransformer,
    effective_time_display, format_span_based, push_time_spans,
};

/// How structured data is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataLayout {
    #[default]
    Inline,
    Multiline,
}

/// Layout toggles, overridable per call through
/// [`FormatOption::Rainbow`](crate::record::FormatOption).
#[derive(Debug, Clone)]
pub struct RainbowFormatOptions {
    pub data: DataLayout,
    pub show_time: bool,
    pub show_location: bool,
    pub show_logger: bool,
    pub show_class: bool,
    pub show_method: bool,
    pub show_log_level: bool,
}

impl Default for RainbowFormatOptions {
    fn default() -> Self {
        RainbowFormatOptions {
            data: DataLayout::Inline,
            show_time: true,
            show_location: true,
            show_logger: true,
            show_class: true,
            show_method: true,
            show_log_level: true,
        }
    }
}

/// Mid-brightness xterm-256 hues that stay readable on dark and light
/// backgrounds.
const PALETTE: [Color; 12] = [
    Color::Indexed(33),
    Color::Indexed(37),
    Color::Indexed(41),
    Color::Indexed(69),
    Color::Indexed(75),
    Color::Indexed(105),
    Color::Indexed(111),
    Color::Indexed(135),
    Color::Indexed(141),
    Color::Indexed(172),
    Color::Indexed(178),
    Color::Indexed(207),
];

/// The hue assigned to an identity name. Stable across runs.
pub(crate) fn identity_color(name: &str) -> Color {
    PALETTE[(stable_hash(name.as_bytes()) % PALETTE.len() as u64) as usize]
}

fn level_badge_style(level: &LogLevel) -> Style {
    let severity = level.severity();
    if severity >= LogLevel::CRITICAL.severity() {
        Style::new().fg(Color::BRIGHT_RED).bold()
    } else if severity >= LogLevel::ERROR.severity() {
        Style::new().fg(Color::RED)
    } else if severity >= LogLevel::WARNING.severity() {
        Style::new().fg(Color::YELLOW)
    } else if severity >= LogLevel::SUCCESS.severity() {
        Style::new().fg(Color::GREEN)
    } else if severity >= LogLevel::NOTICE.severity() {
        Style::new().fg(Color::CYAN)
    } else if severity >= LogLevel::INFO.severity() {
        Style::new().fg(Color::BLUE)
    } else {
        Style::new().fg(Color::GRAY)
    }
}

/// Message color is gated by level, not by identity.
fn message_style(level: &LogLevel) -> Option<Style> {
    let severity = level.severity();
    if severity >= LogLevel::ERROR.severity() {
        Some(Style::new().fg(Color::RED))
    } else if severity >= LogLevel::WARNING.severity() {
        Some(Style::new().fg(Color::YELLOW))
    } else {
        None
    }
}

pub struct RainbowFormatter {
    caps: TerminalCapabilities,
    options: RainbowFormatOptions,
    time_display: TimeDisplay,
    transformers: Vec<Box<dyn SpanTransformer>>,
}

impl RainbowFormatter {
    pub fn new(caps: TerminalCapabilities) -> Self {
        RainbowFormatter {
            caps,
            options: RainbowFormatOptions::default(),
            time_display: TimeDisplay::Auto,
            transformers: Vec::new(),
        }
    }

    pub fn options(mut self, options: RainbowFormatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn time_display(mut self, display: TimeDisplay) -> Self {
        self.time_display = display;
        self
    }

    pub fn add_transformer(mut self, transformer: impl SpanTransformer + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    fn styled_child(tree: &mut SpanTree, parent: SpanId, style: Style, kind: SpanKind) {
        let styled = tree.add_child(parent, SpanKind::Styled(style));
        tree.add_child(styled, kind);
    }
}

impl SpanBasedFormatter for RainbowFormatter {
    fn build_span(&self, record: &LogRecord) -> SpanTree {
        let opts = record.rainbow_options().cloned().unwrap_or_else(|| self.options.clone());
        let mut tree = SpanTree::sequence();
        let root = tree.root();

        let separate = |tree: &mut SpanTree| {
            if !tree.children(root).is_empty() {
                tree.add_child(root, SpanKind::Whitespace);
            }
        };

        if opts.show_time {
            let styled = tree.add_child(root, SpanKind::Styled(Style::new().dim()));
            let display = effective_time_display(record, self.time_display);
            push_time_spans(&mut tree, styled, display, record);
            if tree.children(styled).is_empty() {
                tree.remove(styled);
            }
        }

        if opts.show_log_level {
            separate(&mut tree);
            Self::styled_child(
                &mut tree,
                root,
                level_badge_style(&record.level),
                SpanKind::BracketedLevel(record.level.clone()),
            );
        }

        if opts.show_logger {
            if let Some(name) = &record.logger_name {
                separate(&mut tree);
                Self::styled_child(
                    &mut tree,
                    root,
                    Style::new().fg(identity_color(name)),
                    SpanKind::LoggerName(name.clone()),
                );
            }
        }

        if opts.show_class {
            let class = record
                .instance
                .map(|marker| (marker.type_name().to_string(), Some(marker.hash())))
                .or_else(|| {
                    record
                        .caller_info()
                        .and_then(|c| c.class.clone())
                        .map(|name| (name, None))
                });
            if let Some((name, hash)) = class {
                separate(&mut tree);
                Self::styled_child(
                    &mut tree,
                    root,
                    Style::new().fg(identity_color(&name)),
                    SpanKind::ClassName(name, hash),
                );
            }
        }

        if opts.show_method {
            if let Some(caller) = record.caller_info() {
                separate(&mut tree);
                Self::styled_child(
                    &mut tree,
                    root,
                    Style::new().fg(identity_color(&caller.method)),
                    SpanKind::MethodName(caller.method.clone()),
                );
            }
        }

        if opts.show_location {
            if let Some(caller) = record.caller_info() {
                separate(&mut tree);
                Self::styled_child(
                    &mut tree,
                    root,
                    Style::new().dim(),
                    SpanKind::SourceLocation(caller.file.clone(), caller.line),
                );
            }
        }

        separate(&mut tree);
        let message = SpanKind::LogMessage(record.message_text().unwrap_or_default().to_string());
        match message_style(&record.level) {
            Some(style) => Self::styled_child(&mut tree, root, style, message),
            None => {
                tree.add_child(root, message);
            }
        }

        if !record.data.is_empty() {
            match opts.data {
                DataLayout::Inline => {
                    tree.add_child(root, SpanKind::Whitespace);
                    Self::styled_child(
                        &mut tree,
                        root,
                        Style::new().dim(),
                        SpanKind::InlineData(record.data.clone()),
                    );
                }
                DataLayout::Multiline => {
                    tree.add_child(root, SpanKind::NewLine);
                    Self::styled_child(
                        &mut tree,
                        root,
                        Style::new().dim(),
                        SpanKind::MultilineData(record.data.clone()),
                    );
                }
            }
        }

        if let Some(error) = &record.error {
            tree.add_child(root, SpanKind::NewLine);
            Self::styled_child(
                &mut tree,
                root,
                Style::new().fg(Color::RED),
                SpanKind::ErrorSpan(error.clone()),
            );
        }
        if let Some(trace) = &record.stack_trace {
            tree.add_child(root, SpanKind::NewLine);
            Self::styled_child(
                &mut tree,
                root,
                Style::new().dim(),
                SpanKind::StackTraceSpan(trace.clone()),
            );
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
        self.options.show_location || self.options.show_method || self.options.show_class
    }
}

impl Formatter for RainbowFormatter {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Formatter;
    use crate::record::Data;
    use chrono::TimeZone;

    fn record(level: LogLevel) -> LogRecord {
        LogRecord {
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            level,
            message: Some("payload".into()),
            data: Data::new(),
            error: None,
            stack_trace: None,
            logger_name: Some("worker".into()),
            instance: None,
            caller: None,
            format_options: Vec::new(),
        }
    }

    fn format(formatter: &RainbowFormatter, record: &LogRecord) -> String {
        let mut out = Vec::new();
        formatter.format(record, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn identity_hue_is_stable() {
        assert_eq!(identity_color("worker"), identity_color("worker"));
    }

    #[test]
    fn error_message_is_red_and_info_is_not() {
        let formatter = RainbowFormatter::new(TerminalCapabilities::with_color_support(
            crate::term::ColorSupport::Ansi16,
        ))
        .time_display(TimeDisplay::Off);

        let error_line = format(&formatter, &record(LogLevel::ERROR));
        assert!(error_line.contains("\x1b[31mpayload"));

        let info_line = format(&formatter, &record(LogLevel::INFO));
        assert!(!info_line.contains("\x1b[31mpayload"));
    }

    #[test]
    fn plain_capability_renders_text_only() {
        let formatter =
            RainbowFormatter::new(TerminalCapabilities::none()).time_display(TimeDisplay::Off);
        let line = format(&formatter, &record(LogLevel::INFO));
        assert_eq!(line, "[INFO] worker payload");
    }

    #[test]
    fn per_record_options_override_formatter_defaults() {
        let formatter =
            RainbowFormatter::new(TerminalCapabilities::none()).time_display(TimeDisplay::Off);
        let mut rec = record(LogLevel::INFO);
        rec.format_options
            .push(crate::record::FormatOption::Rainbow(RainbowFormatOptions {
                show_log_level: false,
                show_logger: false,
                show_time: false,
                ..RainbowFormatOptions::default()
            }));
        assert_eq!(format(&formatter, &rec), "payload");
    }

    #[test]
    fn multiline_data_layout() {
        let formatter =
            RainbowFormatter::new(TerminalCapabilities::none()).time_display(TimeDisplay::Off);
        let mut rec = record(LogLevel::INFO);
        rec.data.insert("k".into(), serde_json::json!("v"));
        rec.format_options
            .push(crate::record::FormatOption::Rainbow(RainbowFormatOptions {
                data: DataLayout::Multiline,
                show_time: false,
                ..RainbowFormatOptions::default()
            }));
        assert_eq!(format(&formatter, &rec), "[INFO] worker payload\n  k: v");
    }
}
