//! Minimal, zero-dependency leveled logging for the `metapool` workspace.
//!
//! Messages go to stderr so they interleave cleanly with the allocator's
//! framed fatal diagnostics. The minimum level is a process-global atomic,
//! settable programmatically or through the `METAPOOL_LOG` environment
//! variable on first use.
//!
//! # Example
//!
//! ```
//! use metapool_log::{info, debug, Level};
//!
//! metapool_log::set_level(Level::Debug);
//!
//! info!("arena ready: {} bytes", 4096);
//! debug!("proxy table: {} entries", 12);
//! ```

use std::fmt::Arguments;
use std::io::{IsTerminal, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Message severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Critical failures.
    Error = 0,
    /// Potentially harmful situations.
    Warn = 1,
    /// Informational messages.
    Info = 2,
    /// Diagnostic detail.
    Debug = 3,
    /// Fine-grained tracing.
    Trace = 4,
}

impl Level {
    /// Returns the fixed-width tag printed in front of each message.
    pub const fn tag(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN ",
            Level::Info => "INFO ",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    const fn color(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }

    const fn from_u8(raw: u8) -> Level {
        match raw {
            0 => Level::Error,
            1 => Level::Warn,
            2 => Level::Info,
            3 => Level::Debug,
            _ => Level::Trace,
        }
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Level::Error),
            "warn" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            "trace" => Ok(Level::Trace),
            _ => Err(ParseLevelError),
        }
    }
}

/// Error returned when a level string is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLevelError;

impl std::fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("unrecognized log level (expected error|warn|info|debug|trace)")
    }
}

impl std::error::Error for ParseLevelError {}

// Level slot layout: bit 7 = initialized flag, low bits = Level discriminant.
const INIT_BIT: u8 = 0x80;

static LEVEL: AtomicU8 = AtomicU8::new(0);

/// Sets the minimum level; messages below it are dropped.
pub fn set_level(level: Level) {
    LEVEL.store(level as u8 | INIT_BIT, Ordering::Relaxed);
}

/// Returns the current minimum level, consulting `METAPOOL_LOG` on first use.
pub fn level() -> Level {
    let raw = LEVEL.load(Ordering::Relaxed);
    if raw & INIT_BIT != 0 {
        return Level::from_u8(raw & !INIT_BIT);
    }
    init_from_env()
}

#[cold]
fn init_from_env() -> Level {
    let level = std::env::var("METAPOOL_LOG")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(Level::Warn);
    // Racing initializers agree on the env value; last store wins harmlessly.
    LEVEL.store(level as u8 | INIT_BIT, Ordering::Relaxed);
    level
}

/// Returns whether a message at `level` would currently be emitted.
#[inline]
pub fn enabled(level: Level) -> bool {
    level <= self::level()
}

/// Sink shared by the macros; not part of the public surface.
#[doc(hidden)]
pub fn __emit(level: Level, target: &str, args: Arguments) {
    let stderr = std::io::stderr();
    let colored = stderr.is_terminal();
    let mut out = stderr.lock();

    let _ = if colored {
        writeln!(out, "{}[{}]\x1b[0m {target}: {args}", level.color(), level.tag())
    } else {
        writeln!(out, "[{}] {target}: {args}", level.tag())
    };
}

/// Logs at an explicit level, capturing the caller's module path.
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)*) => {
        if $crate::enabled($level) {
            $crate::__emit($level, module_path!(), format_args!($($arg)*));
        }
    };
}

/// Logs at [`Level::Error`].
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::log!($crate::Level::Error, $($arg)*) };
}

/// Logs at [`Level::Warn`].
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::log!($crate::Level::Warn, $($arg)*) };
}

/// Logs at [`Level::Info`].
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::log!($crate::Level::Info, $($arg)*) };
}

/// Logs at [`Level::Debug`].
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::log!($crate::Level::Debug, $($arg)*) };
}

/// Logs at [`Level::Trace`].
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { $crate::log!($crate::Level::Trace, $($arg)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(Level::Error < Level::Warn);
        assert!(Level::Warn < Level::Info);
        assert!(Level::Info < Level::Debug);
        assert!(Level::Debug < Level::Trace);
    }

    #[test]
    fn level_parsing() {
        assert_eq!("error".parse(), Ok(Level::Error));
        assert_eq!("WARN".parse(), Ok(Level::Warn));
        assert_eq!("Info".parse(), Ok(Level::Info));
        assert_eq!("debug".parse(), Ok(Level::Debug));
        assert_eq!("trace".parse(), Ok(Level::Trace));
        assert_eq!("verbose".parse::<Level>(), Err(ParseLevelError));
    }

    // One test owns the global level; parallel tests must not race it.
    #[test]
    fn filtering_and_macros_track_the_global_level() {
        set_level(Level::Info);
        assert!(enabled(Level::Error));
        assert!(enabled(Level::Info));
        assert!(!enabled(Level::Debug));

        set_level(Level::Trace);
        assert!(enabled(Level::Trace));
        error!("e {}", 1);
        warn!("w {}", 2);
        info!("i {}", 3);
        debug!("d {}", 4);
        trace!("t {}", 5);

        set_level(Level::Error);
        assert!(!enabled(Level::Warn));
    }
}
