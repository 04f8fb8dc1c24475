//! Span transformers and renderer behavior through whole formatters.

use super::record;
use crate::format::Formatter;
use crate::format::simple::SimpleConsoleFormatter;
use crate::clock::TimeDisplay;
use crate::level::LogLevel;
use crate::record::LogRecord;
use crate::span::style::Style;
use crate::span::{BorderStyle, SpanKind, SpanTag, SpanTree};
use crate::term::TerminalCapabilities;

/// Boxes anything at critical severity or above.
fn boxed_criticals(tree: &mut SpanTree, record: &LogRecord) {
    if record.level.severity() >= LogLevel::CRITICAL.severity() {
        tree.wrap(
            tree.root(),
            SpanKind::Bordered {
                style: BorderStyle::Single,
                color: None,
                padding: 1,
            },
        );
    }
}

fn formatter() -> SimpleConsoleFormatter {
    SimpleConsoleFormatter::new(TerminalCapabilities::none())
        .time_display(TimeDisplay::Off)
        .show_location(false)
        .add_transformer(boxed_criticals)
}

fn render(formatter: &SimpleConsoleFormatter, record: &LogRecord) -> String {
    let mut out = Vec::new();
    formatter.format(record, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn transformer_boxes_critical_records_only() {
    let formatter = formatter();

    let boxed = render(&formatter, &record(LogLevel::CRITICAL, "DOWN"));
    assert!(boxed.contains('┌') && boxed.contains('┘'));
    assert!(boxed.contains("[CRITICAL] - DOWN"));

    let plain = render(&formatter, &record(LogLevel::WARNING, "ok"));
    assert!(!plain.contains('┌'));
    assert_eq!(plain, "[WARNING] - ok");
}

#[test]
fn transformers_compose_by_mutating_the_same_tree() {
    // First transformer drops timestamps, second wraps the message in bold;
    // both effects must land in one pass.
    let formatter = SimpleConsoleFormatter::new(TerminalCapabilities::with_color_support(
        crate::term::ColorSupport::Ansi16,
    ))
    .time_display(TimeDisplay::Clock)
    .show_location(false)
    .add_transformer(|tree: &mut SpanTree, _record: &LogRecord| {
        for id in tree.find_all(SpanTag::Timestamp) {
            tree.remove(id);
        }
    })
    .add_transformer(|tree: &mut SpanTree, _record: &LogRecord| {
        if let Some(message) = tree.find_first(SpanTag::LogMessage) {
            tree.wrap(message, SpanKind::Styled(Style::new().bold()));
        }
    });

    let rendered = render(&formatter, &record(LogLevel::INFO, "styled"));
    assert!(!rendered.contains(':'), "timestamp survived: {rendered:?}");
    assert!(rendered.contains("\x1b[1mstyled\x1b[0m"));
}

#[test]
fn transformer_replacement_changes_rendered_text() {
    let formatter = SimpleConsoleFormatter::new(TerminalCapabilities::none())
        .time_display(TimeDisplay::Off)
        .show_location(false)
        .add_transformer(|tree: &mut SpanTree, _record: &LogRecord| {
            if let Some(message) = tree.find_first(SpanTag::LogMessage) {
                tree.replace_with(message, SpanKind::Text("<scrubbed>".into()));
            }
        });

    assert_eq!(
        render(&formatter, &record(LogLevel::INFO, "secret token")),
        "[INFO] - <scrubbed>"
    );
}

#[test]
fn formatting_is_deterministic_across_calls() {
    let formatter = formatter();
    let rec = record(LogLevel::CRITICAL, "same tree, same bytes");
    assert_eq!(render(&formatter, &rec), render(&formatter, &rec));
}
