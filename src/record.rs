//! The immutable log record and its building blocks.
//!
//! A [`LogRecord`] is the frozen bundle carrying one log event from the call
//! site through interceptors to writers. Message bodies may be lazy closures
//! that are only evaluated once a record actually reaches serialization, so
//! filtered records never pay construction cost.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;

use crate::caller::{CallerInfo, CallerToken};
use crate::clock::TimeDisplay;
use crate::format::rainbow::RainbowFormatOptions;
use crate::level::LogLevel;

/// Ordered string-keyed map of structured values. Nested maps and lists are
/// allowed; insertion order is preserved.
pub type Data = serde_json::Map<String, serde_json::Value>;

/// Fixed seeds so identity hashes are stable for the life of the process and
/// reproducible in tests.
const HASH_SEEDS: (u64, u64, u64, u64) = (0x7265, 0x636f, 0x7264, 0x2e72);

/// Deterministic 64-bit hash used for palette hues, instance markers and
/// hash-based sampling.
pub(crate) fn stable_hash(bytes: &[u8]) -> u64 {
    let state = ahash::RandomState::with_seeds(HASH_SEEDS.0, HASH_SEEDS.1, HASH_SEEDS.2, HASH_SEEDS.3);
    state.hash_one(bytes)
}

/// A record message: either an eager string or a zero-argument closure that
/// produces one. Lazy messages are evaluated at most once and the result is
/// cached on the message.
#[derive(Clone)]
pub struct Message {
    kind: MessageKind,
    resolved: OnceCell<String>,
}

#[derive(Clone)]
enum MessageKind {
    Eager(String),
    Lazy(Arc<dyn Fn() -> String + Send + Sync>),
}

impl Message {
    pub fn lazy(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Message {
            kind: MessageKind::Lazy(Arc::new(f)),
            resolved: OnceCell::new(),
        }
    }

    /// Resolves the message body, invoking a lazy closure on first call.
    pub fn resolve(&self) -> &str {
        match &self.kind {
            MessageKind::Eager(s) => s,
            MessageKind::Lazy(f) => self.resolved.get_or_init(|| f()),
        }
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message {
            kind: MessageKind::Eager(s),
            resolved: OnceCell::new(),
        }
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MessageKind::Eager(s) => write!(f, "Message::Eager({:?})", s),
            MessageKind::Lazy(_) => match self.resolved.get() {
                Some(s) => write!(f, "Message::Lazy(resolved: {:?})", s),
                None => write!(f, "Message::Lazy(<unresolved>)"),
            },
        }
    }
}

/// Identifies the specific object a record originated from: the object's
/// short type name plus a 16-bit hash of its address, shown as `Type@1a2b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceMarker {
    type_name: &'static str,
    hash: u16,
}

impl InstanceMarker {
    /// Captures the marker for `instance`. The hash is derived from the
    /// object's address, so two live objects of the same type get distinct
    /// markers while repeated captures of one object agree.
    pub fn of<T: ?Sized>(instance: &T) -> Self {
        let addr = (instance as *const T).cast::<()>() as usize;
        InstanceMarker {
            type_name: short_type_name(std::any::type_name::<T>()),
            hash: (stable_hash(&addr.to_ne_bytes()) & 0xffff) as u16,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn hash(&self) -> u16 {
        self.hash
    }
}

impl fmt::Display for InstanceMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:04x}", self.type_name, self.hash)
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    // `my_app::server::Connection` -> `Connection`; generic arguments keep
    // their full spelling.
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

/// Per-call formatter overrides carried on the record. Formatters pick out
/// the variants addressed to them and ignore the rest.
#[derive(Debug, Clone)]
pub enum FormatOption {
    Rainbow(RainbowFormatOptions),
    Time(TimeDisplay),
}

/// One log event, frozen at the call site.
///
/// Records are assembled by [`Logger::log`](crate::Logger::log) and treated
/// as immutable from then on; interceptors that need to change a record build
/// a replacement instead.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: Option<Message>,
    pub data: Data,
    pub error: Option<String>,
    pub stack_trace: Option<String>,
    pub logger_name: Option<String>,
    pub instance: Option<InstanceMarker>,
    pub caller: Option<CallerToken>,
    pub format_options: Vec<FormatOption>,
}

impl LogRecord {
    /// Resolved message body, evaluating a lazy message on first call.
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.resolve())
    }

    /// Parsed caller site, resolving the captured backtrace on first access.
    /// `None` when no caller token was captured or no foreign frame was
    /// found.
    pub fn caller_info(&self) -> Option<&CallerInfo> {
        self.caller.as_ref().and_then(|token| token.resolve())
    }

    /// The [`TimeDisplay`] override on this record, if any.
    pub fn time_display(&self) -> Option<TimeDisplay> {
        self.format_options.iter().find_map(|opt| match opt {
            FormatOption::Time(display) => Some(*display),
            _ => None,
        })
    }

    /// The rainbow-layout override on this record, if any.
    pub fn rainbow_options(&self) -> Option<&RainbowFormatOptions> {
        self.format_options.iter().find_map(|opt| match opt {
            FormatOption::Rainbow(opts) => Some(opts),
            _ => None,
        })
    }
}
