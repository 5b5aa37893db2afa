//! Core error types.

use std::io;

use thiserror::Error;

/// Errors from the value types in this crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Text is neither an IPv4 nor an IPv6 literal.
    #[error("invalid address: '{ip}:{port}'")]
    InvalidAddress { ip: String, port: u16 },
    /// Completion token carries a kind discriminant we never issue.
    #[error("unknown completion token {0:#018x}")]
    UnknownToken(u64),
    /// Varint framing failure.
    #[error(transparent)]
    Varint(#[from] VarintError),
}

/// Golang varint codec failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarintError {
    /// Ten bytes consumed and still no terminating byte.
    #[error("decode varint 64bit overflow")]
    Overflow,
    /// Tenth byte terminates but carries more than the one bit left in a u64.
    #[error("decode varint underflow: {byte:#04x} at {position}")]
    Underflow { byte: u8, position: usize },
    /// Input ended before the terminating byte.
    #[error("varint incomplete after {read} bytes")]
    Incomplete { read: usize },
    /// Destination buffer exhausted; `written` bytes were stored.
    #[error("varint destination exhausted after {written} bytes")]
    ShortBuffer { written: usize },
}

/// Kernel completion-queue failures.
#[derive(Debug, Error)]
pub enum QueueError {
    /// No free submission entry.
    #[error("submission queue full")]
    Full,
    /// Queue creation failed.
    #[error("queue setup: {0}")]
    Setup(#[source] io::Error),
    /// Handing queued entries to the kernel failed.
    #[error("queue submit: {0}")]
    Submit(#[source] io::Error),
    /// Waiting for a completion failed.
    #[error("queue wait: {0}")]
    Wait(#[source] io::Error),
    /// The wait was interrupted by a signal. Benign; wait again.
    #[error("wait interrupted by signal")]
    Interrupted,
    /// The queue was already torn down.
    #[error("queue already shut down")]
    Closed,
}
