//! Human-facing status/error printing (§7's "single-line human message on
//! stderr" policy), mirroring the teacher's `output::error_output` shape:
//! a color-aware formatter with an auto/always/never mode and a single
//! `✖ {type}: {message}` line per fatal error.

use std::io::{IsTerminal, Write};

use crate::error::IsolateError;

mod ansi {
    pub const RED: &str = "\x1b[31m";
    pub const CYAN: &str = "\x1b[36m";
    pub const RESET: &str = "\x1b[0m";
}

/// Color output mode for terminal display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Error formatter for the CLI's stderr. Mirrors [`IsolateError::error_type`]/
/// [`IsolateError::message`] into a single colored line.
pub struct ErrorOutput {
    use_colors: bool,
}

impl ErrorOutput {
    #[must_use]
    pub fn new(mode: ColorMode) -> Self {
        Self {
            use_colors: Self::should_use_colors(mode),
        }
    }

    #[must_use]
    pub fn stderr() -> Self {
        Self {
            use_colors: Self::stderr_supports_color(),
        }
    }

    fn should_use_colors(mode: ColorMode) -> bool {
        match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => Self::stderr_supports_color(),
        }
    }

    fn stderr_supports_color() -> bool {
        if std::env::var_os("NO_COLOR").is_some() {
            return false;
        }
        std::io::stderr().is_terminal()
    }

    /// Prints `error.error_type()`/`error.message()` as a single stderr
    /// line (§7 policy: fatal errors get a single-line human message).
    pub fn print_error(&self, error: &IsolateError) {
        let mut stderr = std::io::stderr().lock();
        self.write_error(&mut stderr, error);
    }

    pub fn write_error<W: Write>(&self, w: &mut W, error: &IsolateError) {
        if self.use_colors {
            let _ = writeln!(
                w,
                "{}✖ {}{}: {}",
                ansi::RED,
                error.error_type(),
                ansi::RESET,
                error.message()
            );
        } else {
            let _ = writeln!(w, "✖ {}: {}", error.error_type(), error.message());
        }
    }
}

impl Default for ErrorOutput {
    fn default() -> Self {
        Self::stderr()
    }
}

/// Prints a list of written paths (`check`/`hashtable`/`rewrite` on
/// success), one per line, prefixed `wrote` in cyan when colors are on.
pub fn print_written_paths(paths: &[std::path::PathBuf], mode: ColorMode) {
    let use_colors = match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    };
    for path in paths {
        if use_colors {
            println!("{}wrote{} {}", ansi::CYAN, ansi::RESET, path.display());
        } else {
            println!("wrote {}", path.display());
        }
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
