//! The composable rendering tree behind the console formatters.
//!
//! Spans form a mutable tree of arena-allocated nodes addressed by
//! [`SpanId`] handles. Leaf spans emit text, semantic spans describe record
//! fields and build into primitive sub-trees at render time, container spans
//! shape their children (styling, borders, alignment). Transformers mutate
//! the tree in place before rendering, which is what makes cross-cutting
//! layout changes possible without subclassing a formatter.

pub mod render;
pub mod style;

use chrono::{DateTime, Utc};
use smallvec::SmallVec;

use crate::level::LogLevel;
use crate::record::Data;
use style::{Color, Style};

/// Handle to a node in a [`SpanTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanId(usize);

/// Border glyph families for [`SpanKind::Bordered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderStyle {
    #[default]
    Single,
    Double,
    Rounded,
    Heavy,
    Ascii,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Node payload. Leaves and semantic spans have no children; containers do.
#[derive(Debug, Clone)]
pub enum SpanKind {
    // Leaves.
    Text(String),
    Whitespace,
    NewLine,
    Empty,
    // Semantic spans, expanded into primitives at render time.
    Timestamp(DateTime<Utc>),
    FullTimestamp(DateTime<Utc>),
    BracketedLevel(LogLevel),
    LogMessage(String),
    LoggerName(String),
    ClassName(String, Option<u16>),
    MethodName(String),
    SourceLocation(String, Option<u32>),
    InlineData(Data),
    MultilineData(Data),
    KeyValueData(Data),
    ErrorSpan(String),
    StackTraceSpan(String),
    // Containers.
    Sequence { separator: Option<String> },
    Styled(Style),
    Bordered {
        style: BorderStyle,
        color: Option<Color>,
        padding: usize,
    },
    Surrounded {
        prefix: Option<String>,
        suffix: Option<String>,
    },
    Aligned { width: usize, align: Alignment },
}

/// Discriminant of a [`SpanKind`], used for typed traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanTag {
    Text,
    Whitespace,
    NewLine,
    Empty,
    Timestamp,
    FullTimestamp,
    BracketedLevel,
    LogMessage,
    LoggerName,
    ClassName,
    MethodName,
    SourceLocation,
    InlineData,
    MultilineData,
    KeyValueData,
    ErrorSpan,
    StackTraceSpan,
    Sequence,
    Styled,
    Bordered,
    Surrounded,
    Aligned,
}

impl SpanKind {
    pub fn tag(&self) -> SpanTag {
        match self {
            SpanKind::Text(_) => SpanTag::Text,
            SpanKind::Whitespace => SpanTag::Whitespace,
            SpanKind::NewLine => SpanTag::NewLine,
            SpanKind::Empty => SpanTag::Empty,
            SpanKind::Timestamp(_) => SpanTag::Timestamp,
            SpanKind::FullTimestamp(_) => SpanTag::FullTimestamp,
            SpanKind::BracketedLevel(_) => SpanTag::BracketedLevel,
            SpanKind::LogMessage(_) => SpanTag::LogMessage,
            SpanKind::LoggerName(_) => SpanTag::LoggerName,
            SpanKind::ClassName(_, _) => SpanTag::ClassName,
            SpanKind::MethodName(_) => SpanTag::MethodName,
            SpanKind::SourceLocation(_, _) => SpanTag::SourceLocation,
            SpanKind::InlineData(_) => SpanTag::InlineData,
            SpanKind::MultilineData(_) => SpanTag::MultilineData,
            SpanKind::KeyValueData(_) => SpanTag::KeyValueData,
            SpanKind::ErrorSpan(_) => SpanTag::ErrorSpan,
            SpanKind::StackTraceSpan(_) => SpanTag::StackTraceSpan,
            SpanKind::Sequence { .. } => SpanTag::Sequence,
            SpanKind::Styled(_) => SpanTag::Styled,
            SpanKind::Bordered { .. } => SpanTag::Bordered,
            SpanKind::Surrounded { .. } => SpanTag::Surrounded,
            SpanKind::Aligned { .. } => SpanTag::Aligned,
        }
    }
}

#[derive(Debug, Clone)]
struct SpanNode {
    parent: Option<SpanId>,
    kind: SpanKind,
    children: SmallVec<[SpanId; 4]>,
}

/// Arena-backed mutable span tree.
///
/// Detached nodes stay in the arena but are unreachable from the root;
/// traversal and rendering only ever follow child edges from the root.
#[derive(Debug, Clone)]
pub struct SpanTree {
    nodes: Vec<SpanNode>,
    root: SpanId,
}

impl SpanTree {
    pub fn new(root_kind: SpanKind) -> Self {
        SpanTree {
            nodes: vec![SpanNode {
                parent: None,
                kind: root_kind,
                children: SmallVec::new(),
            }],
            root: SpanId(0),
        }
    }

    /// A tree whose root is a separator-less [`SpanKind::Sequence`].
    pub fn sequence() -> Self {
        SpanTree::new(SpanKind::Sequence { separator: None })
    }

    pub fn root(&self) -> SpanId {
        self.root
    }

    pub fn kind(&self, id: SpanId) -> &SpanKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: SpanId) -> &mut SpanKind {
        &mut self.nodes[id.0].kind
    }

    pub fn parent(&self, id: SpanId) -> Option<SpanId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: SpanId) -> &[SpanId] {
        &self.nodes[id.0].children
    }

    /// Appends a new node under `parent` and returns its handle.
    pub fn add_child(&mut self, parent: SpanId, kind: SpanKind) -> SpanId {
        let id = SpanId(self.nodes.len());
        self.nodes.push(SpanNode {
            parent: Some(parent),
            kind,
            children: SmallVec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Convenience: append a [`SpanKind::Text`] leaf.
    pub fn add_text(&mut self, parent: SpanId, text: impl Into<String>) -> SpanId {
        self.add_child(parent, SpanKind::Text(text.into()))
    }

    /// First node with the given tag in depth-first pre-order.
    pub fn find_first(&self, tag: SpanTag) -> Option<SpanId> {
        self.walk(self.root).find(|id| self.kind(*id).tag() == tag)
    }

    /// Every node with the given tag in depth-first pre-order.
    pub fn find_all(&self, tag: SpanTag) -> Vec<SpanId> {
        self.walk(self.root)
            .filter(|id| self.kind(*id).tag() == tag)
            .collect()
    }

    /// All nodes under `id` (inclusive) in depth-first pre-order.
    pub fn descendants(&self, id: SpanId) -> Vec<SpanId> {
        self.walk(id).collect()
    }

    fn walk(&self, from: SpanId) -> impl Iterator<Item = SpanId> + '_ {
        let mut stack = vec![from];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            for child in self.nodes[id.0].children.iter().rev() {
                stack.push(*child);
            }
            Some(id)
        })
    }

    /// Replaces the subtree at `id` with a fresh node of `kind`, returning
    /// the new node's handle. Replacing the root swaps the whole tree.
    pub fn replace_with(&mut self, id: SpanId, kind: SpanKind) -> SpanId {
        let parent = self.nodes[id.0].parent;
        let replacement = SpanId(self.nodes.len());
        self.nodes.push(SpanNode {
            parent,
            kind,
            children: SmallVec::new(),
        });
        match parent {
            Some(parent) => {
                let slot = self.child_slot(parent, id);
                self.nodes[parent.0].children[slot] = replacement;
                self.nodes[id.0].parent = None;
            }
            None => self.root = replacement,
        }
        replacement
    }

    /// Detaches the subtree at `id`. Removing the root empties the tree down
    /// to an [`SpanKind::Empty`] node.
    pub fn remove(&mut self, id: SpanId) {
        match self.nodes[id.0].parent {
            Some(parent) => {
                let slot = self.child_slot(parent, id);
                self.nodes[parent.0].children.remove(slot);
                self.nodes[id.0].parent = None;
            }
            None => {
                self.root = SpanId(self.nodes.len());
                self.nodes.push(SpanNode {
                    parent: None,
                    kind: SpanKind::Empty,
                    children: SmallVec::new(),
                });
            }
        }
    }

    /// Interposes a new container of `kind` between `id` and its parent;
    /// `id` becomes the container's only child. Returns the container.
    pub fn wrap(&mut self, id: SpanId, kind: SpanKind) -> SpanId {
        let parent = self.nodes[id.0].parent;
        let wrapper = SpanId(self.nodes.len());
        self.nodes.push(SpanNode {
            parent,
            kind,
            children: SmallVec::from_slice(&[id]),
        });
        match parent {
            Some(parent) => {
                let slot = self.child_slot(parent, id);
                self.nodes[parent.0].children[slot] = wrapper;
            }
            None => self.root = wrapper,
        }
        self.nodes[id.0].parent = Some(wrapper);
        wrapper
    }

    fn child_slot(&self, parent: SpanId, child: SpanId) -> usize {
        self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == child)
            .expect("child edge must exist")
    }
}

/// Human-facing rendition of a structured value: strings print bare, every
/// other value prints as compact JSON.
pub(crate) fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_tree() -> SpanTree {
        let mut tree = SpanTree::sequence();
        let root = tree.root();
        tree.add_child(root, SpanKind::Timestamp(Utc::now()));
        tree.add_child(root, SpanKind::Whitespace);
        tree.add_child(root, SpanKind::LogMessage("hello".into()));
        tree
    }

    #[test]
    fn find_first_is_preorder() {
        let tree = message_tree();
        assert!(tree.find_first(SpanTag::Timestamp).is_some());
        assert!(tree.find_first(SpanTag::Bordered).is_none());
        let all = tree.find_all(SpanTag::Sequence);
        assert_eq!(all, vec![tree.root()]);
    }

    #[test]
    fn remove_detaches_subtree() {
        let mut tree = message_tree();
        let ts = tree.find_first(SpanTag::Timestamp).unwrap();
        tree.remove(ts);
        assert!(tree.find_first(SpanTag::Timestamp).is_none());
        assert_eq!(tree.children(tree.root()).len(), 2);
    }

    #[test]
    fn replace_with_takes_the_same_slot() {
        let mut tree = message_tree();
        let message = tree.find_first(SpanTag::LogMessage).unwrap();
        tree.replace_with(message, SpanKind::Text("<redacted>".into()));
        let children = tree.children(tree.root());
        assert_eq!(tree.kind(children[2]).tag(), SpanTag::Text);
        assert!(tree.find_first(SpanTag::LogMessage).is_none());
    }

    #[test]
    fn wrap_interposes_a_container() {
        let mut tree = message_tree();
        let message = tree.find_first(SpanTag::LogMessage).unwrap();
        let wrapper = tree.wrap(message, SpanKind::Styled(Style::new().bold()));
        assert_eq!(tree.parent(message), Some(wrapper));
        assert_eq!(tree.children(wrapper), &[message]);
        assert_eq!(tree.kind(tree.children(tree.root())[2]).tag(), SpanTag::Styled);
    }

    #[test]
    fn wrap_at_root_replaces_root() {
        let mut tree = message_tree();
        let root = tree.root();
        let wrapper = tree.wrap(
            root,
            SpanKind::Bordered {
                style: BorderStyle::Rounded,
                color: None,
                padding: 1,
            },
        );
        assert_eq!(tree.root(), wrapper);
        assert_eq!(tree.children(wrapper), &[root]);
    }

    #[test]
    fn display_value_prints_strings_bare() {
        assert_eq!(display_value(&serde_json::json!("plain")), "plain");
        assert_eq!(display_value(&serde_json::json!(7)), "7");
        assert_eq!(display_value(&serde_json::json!({"a": 1})), "{\"a\":1}");
    }
}
