//! Log levels and the logging capability handed to the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of an engine log line, ordered from most to least verbose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Finest-grained tracing
    Trace,
    /// Debugging detail
    Debug,
    /// Normal progress
    Info,
    /// Something unexpected that the engine recovered from
    Warn,
    /// A failure
    Error,
}

impl Level {
    /// Upper-case label of the level, e.g. `"DEBUG"`.
    pub fn name(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// Whether this level is at or below [`Level::Debug`].
    pub fn is_debug(&self) -> bool {
        *self <= Level::Debug
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Destination for engine log lines.
///
/// An implementation is passed into every analysis call. Logging must never
/// fail the analysis, so `log` has no error channel.
pub trait LogOutput: Send + Sync {
    /// Record one log line.
    fn log(&self, message: &str, level: Level);
}

impl<L: LogOutput + ?Sized> LogOutput for &L {
    fn log(&self, message: &str, level: Level) {
        (**self).log(message, level)
    }
}

/// Forwards engine log lines to `tracing` under the `lintd::engine` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogOutput;

impl LogOutput for TracingLogOutput {
    fn log(&self, message: &str, level: Level) {
        match level {
            Level::Trace => tracing::trace!(target: "lintd::engine", "{}", message),
            Level::Debug => tracing::debug!(target: "lintd::engine", "{}", message),
            Level::Info => tracing::info!(target: "lintd::engine", "{}", message),
            Level::Warn => tracing::warn!(target: "lintd::engine", "{}", message),
            Level::Error => tracing::error!(target: "lintd::engine", "{}", message),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_levels() {
        assert!(Level::Trace.is_debug());
        assert!(Level::Debug.is_debug());
        assert!(!Level::Info.is_debug());
        assert!(!Level::Warn.is_debug());
        assert!(!Level::Error.is_debug());
    }

    #[test]
    fn test_level_names() {
        assert_eq!(Level::Debug.name(), "DEBUG");
        assert_eq!(Level::Warn.to_string(), "WARN");
        assert_eq!(serde_json::to_string(&Level::Error).unwrap(), "\"ERROR\"");
    }
}
