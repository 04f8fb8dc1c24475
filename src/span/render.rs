//! Span-tree rendering.
//!
//! Rendering walks the tree recursively with a mutable output buffer and a
//! stack of style frames. Entering a `Styled` container pushes a frame,
//! leaving pops it. Text emission folds the stack into the effective style
//! and writes a minimal SGR reset + re-apply only when that effective style
//! differs from what was last emitted. With no color support the output
//! contains no escape bytes at all.
//!
//! Semantic spans expand into primitive sub-trees here, after transformers
//! have had their chance to rearrange them.

use super::style::Style;
use super::{Alignment, BorderStyle, SpanId, SpanKind, SpanTree, display_value};
use crate::term::{ColorSupport, TerminalCapabilities};

/// Renders `tree` for the given capabilities. Deterministic: the same tree
/// and capability produce byte-identical output.
pub fn render_to_string(tree: &SpanTree, caps: &TerminalCapabilities) -> String {
    let mut state = RenderState::new(caps.color_support);
    render_node(tree, tree.root(), &mut state);
    state.finish()
}

struct RenderState {
    out: String,
    stack: Vec<Style>,
    /// Style currently active in `out`, tracked to emit minimal SGR diffs.
    active: Style,
    support: ColorSupport,
}

impl RenderState {
    fn new(support: ColorSupport) -> Self {
        RenderState {
            out: String::new(),
            stack: Vec::new(),
            active: Style::default(),
            support,
        }
    }

    fn emit_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.support != ColorSupport::None {
            let effective = Style::effective(&self.stack);
            if effective != self.active {
                if !self.active.is_plain() {
                    self.out.push_str("\x1b[0m");
                }
                self.out.push_str(&effective.sgr_sequence(self.support));
                self.active = effective;
            }
        }
        self.out.push_str(text);
    }

    /// Appends an already-rendered, self-contained chunk (it starts from a
    /// reset state and ends reset). The active style is normalized first so
    /// the chunk's assumption holds.
    fn append_chunk(&mut self, chunk: &str) {
        self.reset();
        self.out.push_str(chunk);
    }

    fn reset(&mut self) {
        if !self.active.is_plain() {
            self.out.push_str("\x1b[0m");
            self.active = Style::default();
        }
    }

    fn finish(mut self) -> String {
        self.reset();
        self.out
    }
}

fn render_node(tree: &SpanTree, id: SpanId, state: &mut RenderState) {
    match tree.kind(id) {
        SpanKind::Text(text) => state.emit_text(text),
        SpanKind::Whitespace => state.emit_text(" "),
        SpanKind::NewLine => state.out.push('\n'),
        SpanKind::Empty => {}

        SpanKind::Sequence { separator } => {
            let mut first = true;
            for child in tree.children(id) {
                if !first {
                    if let Some(sep) = separator {
                        state.emit_text(sep);
                    }
                }
                first = false;
                render_node(tree, *child, state);
            }
        }
        SpanKind::Styled(style) => {
            state.stack.push(*style);
            for child in tree.children(id) {
                render_node(tree, *child, state);
            }
            state.stack.pop();
        }
        SpanKind::Surrounded { prefix, suffix } => {
            if let Some(prefix) = prefix {
                state.emit_text(prefix);
            }
            for child in tree.children(id) {
                render_node(tree, *child, state);
            }
            if let Some(suffix) = suffix {
                state.emit_text(suffix);
            }
        }
        SpanKind::Aligned { width, align } => {
            let chunk = render_children_chunk(tree, id, state);
            let visible = visible_width(&chunk);
            if visible > *width {
                state.append_chunk(&truncate_visible(&chunk, *width));
            } else {
                let (left, right) = pad_counts(*width - visible, *align);
                state.emit_text(&" ".repeat(left));
                state.append_chunk(&chunk);
                state.emit_text(&" ".repeat(right));
            }
        }
        SpanKind::Bordered {
            style,
            color,
            padding,
        } => {
            let chunk = render_children_chunk(tree, id, state);
            render_border(&chunk, *style, *color, *padding, state);
        }

        semantic => {
            let expanded = expand_semantic(semantic);
            render_node(&expanded, expanded.root(), state);
        }
    }
}

/// Renders `id`'s children into a self-contained string using the current
/// style stack, so containers can measure before emitting.
fn render_children_chunk(tree: &SpanTree, id: SpanId, state: &RenderState) -> String {
    let mut sub = RenderState::new(state.support);
    sub.stack = state.stack.clone();
    for child in tree.children(id) {
        render_node(tree, *child, &mut sub);
    }
    sub.finish()
}

fn pad_counts(missing: usize, align: Alignment) -> (usize, usize) {
    match align {
        Alignment::Left => (0, missing),
        Alignment::Right => (missing, 0),
        Alignment::Center => (missing / 2, missing - missing / 2),
    }
}

/// `(top_left, top_right, bottom_left, bottom_right, horizontal, vertical)`
fn border_glyphs(style: BorderStyle) -> (&'static str, &'static str, &'static str, &'static str, &'static str, &'static str) {
    match style {
        BorderStyle::Single => ("┌", "┐", "└", "┘", "─", "│"),
        BorderStyle::Double => ("╔", "╗", "╚", "╝", "═", "║"),
        BorderStyle::Rounded => ("╭", "╮", "╰", "╯", "─", "│"),
        BorderStyle::Heavy => ("┏", "┓", "┗", "┛", "━", "┃"),
        BorderStyle::Ascii => ("+", "+", "+", "+", "-", "|"),
    }
}

fn render_border(
    chunk: &str,
    border: BorderStyle,
    color: Option<super::style::Color>,
    padding: usize,
    state: &mut RenderState,
) {
    let (tl, tr, bl, br, horizontal, vertical) = border_glyphs(border);
    let lines: Vec<&str> = chunk.split('\n').collect();
    let content_width = lines.iter().map(|l| visible_width(l)).max().unwrap_or(0);
    let inner = content_width + 2 * padding;

    let frame_style = color.map(|c| Style::new().fg(c)).unwrap_or_default();
    let frame = |state: &mut RenderState, glyphs: &str| {
        // The border color applies to frame glyphs only, never to content.
        state.stack.push(frame_style);
        state.emit_text(glyphs);
        state.stack.pop();
    };

    frame(state, &format!("{}{}{}", tl, horizontal.repeat(inner), tr));
    state.out.push('\n');
    for line in &lines {
        frame(state, vertical);
        state.emit_text(&" ".repeat(padding));
        state.append_chunk(line);
        let fill = content_width - visible_width(line) + padding;
        state.emit_text(&" ".repeat(fill));
        frame(state, vertical);
        state.out.push('\n');
    }
    frame(state, &format!("{}{}{}", bl, horizontal.repeat(inner), br));
}

/// Character count excluding SGR escape sequences.
pub(crate) fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Consume a CSI sequence through its final byte.
            for follow in chars.by_ref() {
                if follow.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

/// Keeps the first `width` visible characters, preserving escape sequences
/// seen along the way and terminating with a reset when any were emitted.
fn truncate_visible(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut visible = 0;
    let mut saw_escape = false;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            saw_escape = true;
            out.push(c);
            for follow in chars.by_ref() {
                out.push(follow);
                if follow.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        if visible == width {
            break;
        }
        out.push(c);
        visible += 1;
    }
    if saw_escape && !out.ends_with("\x1b[0m") {
        out.push_str("\x1b[0m");
    }
    out
}

/// Builds the primitive sub-tree for a semantic span.
fn expand_semantic(kind: &SpanKind) -> SpanTree {
    match kind {
        SpanKind::Timestamp(dt) => {
            SpanTree::new(SpanKind::Text(dt.format("%H:%M:%S%.3f").to_string()))
        }
        SpanKind::FullTimestamp(dt) => {
            SpanTree::new(SpanKind::Text(dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string()))
        }
        SpanKind::BracketedLevel(level) => {
            let mut tree = SpanTree::new(SpanKind::Surrounded {
                prefix: Some("[".into()),
                suffix: Some("]".into()),
            });
            let root = tree.root();
            tree.add_text(root, level.display_name());
            tree
        }
        SpanKind::LogMessage(message) => SpanTree::new(SpanKind::Text(message.clone())),
        SpanKind::LoggerName(name) => SpanTree::new(SpanKind::Text(name.clone())),
        SpanKind::ClassName(name, hash) => SpanTree::new(SpanKind::Text(match hash {
            Some(hash) => format!("{}@{:04x}", name, hash),
            None => name.clone(),
        })),
        SpanKind::MethodName(name) => SpanTree::new(SpanKind::Text(name.clone())),
        SpanKind::SourceLocation(file, line) => SpanTree::new(SpanKind::Text(match line {
            Some(line) => format!("{}:{}", file, line),
            None => file.clone(),
        })),
        SpanKind::InlineData(data) => {
            if data.is_empty() {
                return SpanTree::new(SpanKind::Empty);
            }
            let mut tree = SpanTree::new(SpanKind::Surrounded {
                prefix: Some("(".into()),
                suffix: Some(")".into()),
            });
            let root = tree.root();
            let seq = tree.add_child(
                root,
                SpanKind::Sequence {
                    separator: Some(", ".into()),
                },
            );
            for (key, value) in data {
                tree.add_text(seq, format!("{}: {}", key, display_value(value)));
            }
            tree
        }
        SpanKind::MultilineData(data) => {
            if data.is_empty() {
                return SpanTree::new(SpanKind::Empty);
            }
            let mut tree = SpanTree::new(SpanKind::Sequence {
                separator: Some("\n".into()),
            });
            let root = tree.root();
            for (key, value) in data {
                tree.add_text(root, format!("  {}: {}", key, display_value(value)));
            }
            tree
        }
        SpanKind::KeyValueData(data) => {
            if data.is_empty() {
                return SpanTree::new(SpanKind::Empty);
            }
            let mut tree = SpanTree::new(SpanKind::Sequence {
                separator: Some(" ".into()),
            });
            let root = tree.root();
            for (key, value) in data {
                tree.add_text(root, format!("{}={}", key, display_value(value)));
            }
            tree
        }
        SpanKind::ErrorSpan(error) => SpanTree::new(SpanKind::Text(error.clone())),
        SpanKind::StackTraceSpan(trace) => SpanTree::new(SpanKind::Text(trace.clone())),
        // Leaves and containers are rendered directly, never expanded.
        other => unreachable!("not a semantic span: {:?}", other.tag()),
    }
}
