//! Terminal capability description and detection.
//!
//! The span renderer is fully determined by an injected
//! [`TerminalCapabilities`] descriptor, so tests pin output by constructing
//! one directly. [`TerminalCapabilities::detect`] inspects the conventional
//! environment variables and the sink's TTY status.

use std::io::IsTerminal;

/// How many colors the sink can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSupport {
    /// No escape sequences at all.
    #[default]
    None,
    /// The 16 basic ANSI colors.
    Ansi16,
    /// The xterm 256-color palette.
    Ansi256,
    /// 24-bit RGB.
    TrueColor,
}

/// Capabilities of one output sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalCapabilities {
    pub color_support: ColorSupport,
}

impl TerminalCapabilities {
    pub const fn none() -> Self {
        TerminalCapabilities {
            color_support: ColorSupport::None,
        }
    }

    pub const fn truecolor() -> Self {
        TerminalCapabilities {
            color_support: ColorSupport::TrueColor,
        }
    }

    pub const fn with_color_support(color_support: ColorSupport) -> Self {
        TerminalCapabilities { color_support }
    }

    /// Detects capabilities for stdout.
    pub fn detect_stdout() -> Self {
        Self::detect(std::io::stdout().is_terminal(), |name| {
            std::env::var(name).ok()
        })
    }

    /// Detects capabilities for stderr.
    pub fn detect_stderr() -> Self {
        Self::detect(std::io::stderr().is_terminal(), |name| {
            std::env::var(name).ok()
        })
    }

    /// Environment-variable detection with an injectable lookup:
    ///
    /// - `NO_COLOR` forces [`ColorSupport::None`].
    /// - `FORCE_COLOR` forces at least 16 colors, even off-TTY.
    /// - `COLORTERM=truecolor|24bit` implies [`ColorSupport::TrueColor`].
    /// - A non-TTY sink defaults to [`ColorSupport::None`].
    pub fn detect(is_tty: bool, env: impl Fn(&str) -> Option<String>) -> Self {
        if env("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            return Self::none();
        }

        let colorterm = env("COLORTERM").unwrap_or_default().to_lowercase();
        let truecolor = colorterm == "truecolor" || colorterm == "24bit";

        let forced = env("FORCE_COLOR").is_some_and(|v| !v.is_empty() && v != "0");
        if !is_tty && !forced {
            return Self::none();
        }

        let color_support = if truecolor {
            ColorSupport::TrueColor
        } else if env("TERM").unwrap_or_default().contains("256color") {
            ColorSupport::Ansi256
        } else {
            ColorSupport::Ansi16
        };
        TerminalCapabilities { color_support }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn no_color_wins_over_everything() {
        let caps = TerminalCapabilities::detect(
            true,
            env_of(&[("NO_COLOR", "1"), ("COLORTERM", "truecolor")]),
        );
        assert_eq!(caps.color_support, ColorSupport::None);
    }

    #[test]
    fn non_tty_defaults_to_none() {
        let caps = TerminalCapabilities::detect(false, env_of(&[]));
        assert_eq!(caps.color_support, ColorSupport::None);
    }

    #[test]
    fn force_color_overrides_tty_probe() {
        let caps = TerminalCapabilities::detect(false, env_of(&[("FORCE_COLOR", "1")]));
        assert_eq!(caps.color_support, ColorSupport::Ansi16);
    }

    #[test]
    fn colorterm_implies_truecolor() {
        let caps = TerminalCapabilities::detect(true, env_of(&[("COLORTERM", "truecolor")]));
        assert_eq!(caps.color_support, ColorSupport::TrueColor);
    }

    #[test]
    fn term_with_256color_suffix() {
        let caps = TerminalCapabilities::detect(true, env_of(&[("TERM", "xterm-256color")]));
        assert_eq!(caps.color_support, ColorSupport::Ansi256);
    }
}
