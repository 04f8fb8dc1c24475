//! Lazy caller-site resolution.
//!
//! Capturing a backtrace is cheap compared to resolving it, so the log call
//! site only stores an opaque [`CallerToken`]. The frames are rendered and
//! parsed on first access to [`CallerToken::resolve`] and the result is
//! cached, making later accesses O(1). When no writer or interceptor in the
//! effective chain needs caller info, no token is captured at all.

use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

/// Parsed call-site information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerInfo {
    /// Source file as spelled in the backtrace.
    pub file: String,
    pub line: Option<u32>,
    /// Function or method name, with closure markers and symbol hashes
    /// stripped.
    pub method: String,
    /// Receiver type when the frame is a method (`Receiver::method`).
    pub class: Option<String>,
}

/// Opaque handle around a captured-but-unresolved backtrace.
#[derive(Clone)]
pub struct CallerToken {
    backtrace: Arc<Backtrace>,
    parsed: Arc<OnceCell<Option<CallerInfo>>>,
}

impl CallerToken {
    /// Captures the current backtrace without resolving symbols.
    pub fn capture() -> Self {
        CallerToken {
            backtrace: Arc::new(Backtrace::force_capture()),
            parsed: Arc::new(OnceCell::new()),
        }
    }

    /// Resolves and caches the first foreign frame. Returns `None` when every
    /// frame belongs to the logging machinery or the runtime.
    pub fn resolve(&self) -> Option<&CallerInfo> {
        self.parsed
            .get_or_init(|| parse_first_foreign_frame(&self.backtrace.to_string()))
            .as_ref()
    }
}

impl fmt::Debug for CallerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parsed.get() {
            Some(info) => write!(f, "CallerToken(resolved: {:?})", info),
            None => write!(f, "CallerToken(<unresolved>)"),
        }
    }
}

static FRAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+:\s+(.+?)\s*$").unwrap());
static AT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*at\s+(.+?):(\d+)(?::\d+)?\s*$").unwrap());
static SYMBOL_HASH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"::h[0-9a-f]{16}$").unwrap());

/// Frames whose symbol starts with one of these belong to the runtime or to
/// this crate and are skipped when looking for the call site.
const SKIPPED_PREFIXES: &[&str] = &[
    "treelog::",
    "<treelog::",
    "std::",
    "core::",
    "alloc::",
    "backtrace::",
    "rust_begin_unwind",
    "__rust",
    "_start",
];

pub(crate) fn parse_first_foreign_frame(rendered: &str) -> Option<CallerInfo> {
    let mut lines = rendered.lines().peekable();
    while let Some(line) = lines.next() {
        let Some(caps) = FRAME_RE.captures(line) else {
            continue;
        };
        let symbol = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let location = lines
            .peek()
            .and_then(|next| AT_RE.captures(next))
            .map(|at| {
                (
                    at.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
                    at.get(2).and_then(|m| m.as_str().parse::<u32>().ok()),
                )
            });

        if SKIPPED_PREFIXES.iter().any(|p| symbol.starts_with(p)) {
            continue;
        }

        let (method, class) = split_symbol(symbol);
        let (file, line_no) = location.unwrap_or_default();
        return Some(CallerInfo {
            file,
            line: line_no,
            method,
            class,
        });
    }
    None
}

/// `my_app::server::Connection::handle::h0123456789abcdef` becomes
/// `(handle, Some(Connection))`. Closure markers are dropped; trait-impl
/// symbols (`<Type as Trait>::method`) resolve the class from `Type`.
fn split_symbol(symbol: &str) -> (String, Option<String>) {
    let symbol = SYMBOL_HASH_RE.replace(symbol, "");

    let (path, class_hint) = match symbol.strip_prefix('<') {
        Some(rest) => {
            let inner = rest.split_once('>').map(|(head, tail)| (head, tail));
            match inner {
                Some((head, tail)) => {
                    let ty = head.split(" as ").next().unwrap_or(head);
                    let class = ty.rsplit("::").next().map(|s| s.to_string());
                    (tail.trim_start_matches("::").to_string(), class)
                }
                None => (symbol.to_string(), None),
            }
        }
        None => (symbol.to_string(), None),
    };

    let segments: Vec<&str> = path
        .split("::")
        .filter(|seg| !seg.is_empty() && *seg != "{{closure}}")
        .collect();

    let method = segments.last().map(|s| s.to_string()).unwrap_or_default();
    let class = class_hint.or_else(|| {
        segments
            .iter()
            .rev()
            .nth(1)
            .filter(|seg| seg.chars().next().is_some_and(|c| c.is_ascii_uppercase()))
            .map(|s| s.to_string())
    });
    (method, class)
}
