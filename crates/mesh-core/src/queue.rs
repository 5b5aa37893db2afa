//! Completion-queue abstraction.
//!
//! A `CompletionQueue` accepts raw kernel operations tagged with a
//! [`Token`] and hands back one [`Completion`] at a time. The reactor is
//! written against this trait only.
//!
//! # Implementors
//!
//! - `UringQueue` (mesh-reactor): one io_uring instance, no SQPOLL, no
//!   fixed files, no registered buffers.
//! - `MockQueue` (mesh-reactor tests): records submissions and replays
//!   scripted completions.
//!
//! # Memory contract
//!
//! The pointers inside an [`IoOp`] are read and written by the kernel after
//! `submit` returns. The caller keeps the pointed-to memory alive and
//! unmoved until the matching completion has been taken from `wait`, or
//! until `shutdown` has returned.

use std::os::fd::RawFd;

use crate::error::QueueError;
use crate::token::{EventKind, Token};

/// One kernel operation, described by the raw memory the kernel will use.
#[derive(Debug, Clone, Copy)]
pub enum IoOp {
    /// `accept4(fd, addr, addr_len, flags)`
    Accept {
        fd: RawFd,
        addr: *mut libc::sockaddr,
        addr_len: *mut libc::socklen_t,
        flags: i32,
    },
    /// `readv(fd, iov, 1)`
    Readv { fd: RawFd, iov: *const libc::iovec },
    /// `close(fd)`
    Close { fd: RawFd },
}

impl IoOp {
    #[inline]
    pub fn fd(&self) -> RawFd {
        match *self {
            IoOp::Accept { fd, .. } | IoOp::Readv { fd, .. } | IoOp::Close { fd } => fd,
        }
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            IoOp::Accept { .. } => EventKind::Accept,
            IoOp::Readv { .. } => EventKind::Read,
            IoOp::Close { .. } => EventKind::Close,
        }
    }
}

/// A finished operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// The token passed to `submit`.
    pub token: Token,
    /// Syscall return value, or negative errno.
    pub result: i32,
}

/// Submission and completion against one kernel queue.
pub trait CompletionQueue {
    /// Queue one operation under `token`. Submissions reach the kernel no
    /// later than the next `wait`.
    ///
    /// Returns `Err(QueueError::Full)` when no submission entry is free.
    ///
    /// # Safety
    ///
    /// Every pointer in `op` must stay valid and unmoved until the
    /// completion for `token` has been returned by `wait`, or until
    /// `shutdown` returns.
    unsafe fn submit(&mut self, op: IoOp, token: Token) -> Result<(), QueueError>;

    /// Flush pending submissions and block until one completion is
    /// available, then take it off the queue.
    ///
    /// A signal arriving during the wait yields `Err(QueueError::Interrupted)`.
    fn wait(&mut self) -> Result<Completion, QueueError>;

    /// Operations submitted and not yet returned by `wait`.
    fn inflight(&self) -> usize;

    /// Submission queue depth.
    fn capacity(&self) -> usize;

    /// Release the kernel queue. Idempotent. After this, `submit` and
    /// `wait` return `Err(QueueError::Closed)`.
    fn shutdown(&mut self);

    fn is_shut_down(&self) -> bool;
}
