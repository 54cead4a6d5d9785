//! Forwards engine log lines onto the out-of-band log stream.

use std::fmt;
use std::sync::Arc;

use lintd::{Level, LogOutput, Sink};

use crate::proto;

/// Log output that forwards to an attached log sink, if any.
///
/// Delivery is best-effort. Without a sink `log` does nothing; when the sink
/// rejects an event the failure is dropped so that logging can never abort
/// an analysis.
#[derive(Default)]
pub struct LogProxy {
    sink: Option<Arc<dyn Sink<proto::LogEvent>>>,
}

impl fmt::Debug for LogProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogProxy")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl LogProxy {
    /// Create a proxy with no sink attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `sink`, replacing any previous one.
    pub fn attach(&mut self, sink: Arc<dyn Sink<proto::LogEvent>>) {
        self.sink = Some(sink);
    }

    /// Whether a sink is attached.
    pub fn is_attached(&self) -> bool {
        self.sink.is_some()
    }
}

impl LogOutput for LogProxy {
    fn log(&self, message: &str, level: Level) {
        let Some(sink) = &self.sink else {
            return;
        };

        let event = proto::LogEvent {
            level: level.name().to_string(),
            log: message.to_string(),
            is_debug: level.is_debug(),
        };
        if let Err(e) = sink.send(event) {
            tracing::trace!("dropped engine log line: {}", e);
        }
    }
}
