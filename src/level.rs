//! Log levels.
//!
//! A level is a `(name, severity)` pair. Ordering, equality and filtering are
//! defined by severity alone, so user-defined levels slot in anywhere between
//! the built-ins.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

/// A named severity.
///
/// The built-in levels are available as associated constants. Custom levels
/// can be created with [`LogLevel::custom`]:
///
/// ```rust
/// use treelog::LogLevel;
///
/// let audit = LogLevel::custom("audit", 350);
/// assert!(audit > LogLevel::NOTICE);
/// assert!(audit < LogLevel::WARNING);
/// ```
#[derive(Debug, Clone)]
pub struct LogLevel {
    name: Cow<'static, str>,
    severity: i32,
}

impl LogLevel {
    pub const TRACE: LogLevel = LogLevel::builtin("trace", 0);
    pub const DEBUG: LogLevel = LogLevel::builtin("debug", 100);
    pub const INFO: LogLevel = LogLevel::builtin("info", 200);
    pub const NOTICE: LogLevel = LogLevel::builtin("notice", 300);
    pub const SUCCESS: LogLevel = LogLevel::builtin("success", 310);
    pub const WARNING: LogLevel = LogLevel::builtin("warning", 400);
    pub const ERROR: LogLevel = LogLevel::builtin("error", 500);
    pub const CRITICAL: LogLevel = LogLevel::builtin("critical", 600);
    pub const WTF: LogLevel = LogLevel::builtin("wtf", 1000);

    const fn builtin(name: &'static str, severity: i32) -> Self {
        LogLevel {
            name: Cow::Borrowed(name),
            severity,
        }
    }

    /// Creates a custom level. Two levels with the same severity compare
    /// equal regardless of name.
    pub fn custom(name: impl Into<Cow<'static, str>>, severity: i32) -> Self {
        LogLevel {
            name: name.into(),
            severity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn severity(&self) -> i32 {
        self.severity
    }

    /// Uppercase form used by bracketed console layouts, e.g. `WARNING`.
    pub fn display_name(&self) -> String {
        self.name.to_uppercase()
    }
}

impl PartialEq for LogLevel {
    fn eq(&self, other: &Self) -> bool {
        self.severity == other.severity
    }
}

impl Eq for LogLevel {}

impl PartialOrd for LogLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity.cmp(&other.severity)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
