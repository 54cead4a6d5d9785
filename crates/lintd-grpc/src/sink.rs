//! Outbound streams backed by tokio channels.

use lintd::{Sink, SinkError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tonic::Status;

/// A sink that is also the producing end of an RPC response stream.
///
/// The terminal signals take `self`, so a stream can be terminated at most
/// once.
pub trait StreamSink<M>: Sink<M> {
    /// End the stream successfully.
    fn complete(self);

    /// End the stream with an error status.
    fn fail(self, status: Status);
}

/// A sink feeding the receiving half of a tonic response stream.
///
/// Sends wait for channel capacity, so the producer is slowed to the
/// consumer's pace. Closing the sink (via [`StreamSink::complete`] or
/// dropping it) ends the stream with an OK status once every clone of the
/// sender is gone.
///
/// Must be used from a blocking thread, never from inside an async task.
#[derive(Debug)]
pub struct ChannelSink<M> {
    tx: mpsc::Sender<Result<M, Status>>,
}

impl<M> ChannelSink<M> {
    /// Create a sink over `tx`.
    pub fn new(tx: mpsc::Sender<Result<M, Status>>) -> Self {
        Self { tx }
    }
}

impl<M: Send> Sink<M> for ChannelSink<M> {
    fn send(&self, message: M) -> Result<(), SinkError> {
        self.tx
            .blocking_send(Ok(message))
            .map_err(|_| SinkError::Closed)
    }
}

impl<M: Send> StreamSink<M> for ChannelSink<M> {
    fn complete(self) {
        drop(self.tx);
    }

    fn fail(self, status: Status) {
        if self.tx.blocking_send(Err(status)).is_err() {
            tracing::debug!("stream receiver gone before error status could be sent");
        }
    }
}

/// A sink that never waits and drops messages when the channel is full.
///
/// The stream it feeds stays open for as long as the sink is alive.
#[derive(Debug)]
pub struct LossySink<M> {
    tx: mpsc::Sender<Result<M, Status>>,
}

impl<M> LossySink<M> {
    /// Create a sink over `tx`.
    pub fn new(tx: mpsc::Sender<Result<M, Status>>) -> Self {
        Self { tx }
    }
}

impl<M: Send> Sink<M> for LossySink<M> {
    fn send(&self, message: M) -> Result<(), SinkError> {
        self.tx.try_send(Ok(message)).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// What a [`RecordingSink`] has seen.
    #[derive(Debug)]
    pub(crate) struct Recorded<M> {
        pub messages: Vec<M>,
        pub completed: usize,
        pub failed: Vec<Status>,
    }

    /// In-memory sink for tests. Clones share one record.
    #[derive(Debug)]
    pub(crate) struct RecordingSink<M> {
        record: Arc<Mutex<Recorded<M>>>,
        reject_with: Option<SinkError>,
    }

    impl<M> Clone for RecordingSink<M> {
        fn clone(&self) -> Self {
            Self {
                record: Arc::clone(&self.record),
                reject_with: self.reject_with.clone(),
            }
        }
    }

    #[allow(clippy::unwrap_used)]
    impl<M> RecordingSink<M> {
        pub fn new() -> Self {
            Self {
                record: Arc::new(Mutex::new(Recorded {
                    messages: Vec::new(),
                    completed: 0,
                    failed: Vec::new(),
                })),
                reject_with: None,
            }
        }

        /// A sink whose every `send` fails with `error`.
        pub fn rejecting(error: SinkError) -> Self {
            Self {
                reject_with: Some(error),
                ..Self::new()
            }
        }

        pub fn with<R>(&self, f: impl FnOnce(&Recorded<M>) -> R) -> R {
            f(&self.record.lock().unwrap())
        }
    }

    #[allow(clippy::unwrap_used)]
    impl<M: Send> Sink<M> for RecordingSink<M> {
        fn send(&self, message: M) -> Result<(), SinkError> {
            if let Some(error) = &self.reject_with {
                return Err(error.clone());
            }
            self.record.lock().unwrap().messages.push(message);
            Ok(())
        }
    }

    #[allow(clippy::unwrap_used)]
    impl<M: Send> StreamSink<M> for RecordingSink<M> {
        fn complete(self) {
            self.record.lock().unwrap().completed += 1;
        }

        fn fail(self, status: Status) {
            self.record.lock().unwrap().failed.push(status);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_sink_delivers_then_completes() {
        let (tx, mut rx) = mpsc::channel::<Result<u32, Status>>(4);
        let sink = ChannelSink::new(tx);
        sink.send(1).unwrap();
        sink.send(2).unwrap();
        sink.complete();

        assert_eq!(rx.blocking_recv().unwrap().unwrap(), 1);
        assert_eq!(rx.blocking_recv().unwrap().unwrap(), 2);
        assert!(rx.blocking_recv().is_none());
    }

    #[test]
    fn test_fail_sends_status_then_closes() {
        let (tx, mut rx) = mpsc::channel::<Result<u32, Status>>(4);
        ChannelSink::new(tx).fail(Status::internal("boom"));

        let status = rx.blocking_recv().unwrap().unwrap_err();
        assert_eq!(status.code(), tonic::Code::Internal);
        assert_eq!(status.message(), "boom");
        assert!(rx.blocking_recv().is_none());
    }

    #[test]
    fn test_send_after_receiver_dropped_is_closed() {
        let (tx, rx) = mpsc::channel::<Result<u32, Status>>(4);
        drop(rx);
        assert_eq!(ChannelSink::new(tx.clone()).send(1), Err(SinkError::Closed));
        assert_eq!(LossySink::new(tx).send(1), Err(SinkError::Closed));
    }

    #[test]
    fn test_lossy_sink_reports_full() {
        let (tx, _rx) = mpsc::channel::<Result<u32, Status>>(1);
        let sink = LossySink::new(tx);
        sink.send(1).unwrap();
        assert_eq!(sink.send(2), Err(SinkError::Full));
    }
}
