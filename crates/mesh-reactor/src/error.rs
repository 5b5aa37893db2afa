//! Reactor error types.

use std::io;

use mesh_core::{CoreError, EventKind, QueueError};
use thiserror::Error;

/// Everything that can stop the reactor.
///
/// Non-positive reads are connection transitions, not errors; none of
/// these variants are produced for them.
#[derive(Debug, Error)]
pub enum ReactorError {
    #[error("socket(): {0}")]
    Socket(#[source] io::Error),

    #[error("setsockopt({option}): {source}")]
    SetOption {
        option: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("bind({addr}): {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("listen(): {0}")]
    Listen(#[source] io::Error),

    /// A read larger than the fixed event buffer was requested.
    #[error("cannot read {requested} bytes into a {capacity}-byte buffer")]
    Overflow { requested: usize, capacity: usize },

    #[error("{kind} pool exhausted (capacity {capacity})")]
    PoolExhausted { kind: EventKind, capacity: usize },

    #[error("invalid config: {0}")]
    Config(&'static str),

    #[error("signal setup: {0}")]
    Signal(#[from] nix::Error),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for reactor operations.
pub type Result<T> = std::result::Result<T, ReactorError>;
