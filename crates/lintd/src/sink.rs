//! Outbound message destinations.

use std::sync::Arc;

use thiserror::Error;

/// Why a sink rejected a message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    /// The receiving side has gone away
    #[error("sink closed")]
    Closed,
    /// The sink is at capacity and does not wait
    #[error("sink full")]
    Full,
    /// Transport-level failure
    #[error("transport error: {0}")]
    Transport(String),
}

/// A destination that accepts one message at a time and may fail.
pub trait Sink<M>: Send + Sync {
    /// Deliver one message.
    fn send(&self, message: M) -> Result<(), SinkError>;
}

impl<M, S: Sink<M> + ?Sized> Sink<M> for Arc<S> {
    fn send(&self, message: M) -> Result<(), SinkError> {
        (**self).send(message)
    }
}

impl<M, S: Sink<M> + ?Sized> Sink<M> for &S {
    fn send(&self, message: M) -> Result<(), SinkError> {
        (**self).send(message)
    }
}
