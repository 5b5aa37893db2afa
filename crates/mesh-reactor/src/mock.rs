//! In-memory `CompletionQueue` for tests.
//!
//! Records every submission and replays completions the test scripts.
//! Read completions can carry a payload, which is copied through the
//! submitted iovec exactly as the kernel would.

use std::collections::VecDeque;
use std::io;
use std::os::fd::RawFd;

use mesh_core::{Completion, CompletionQueue, EventKind, IoOp, QueueError, Token};

pub struct MockQueue {
    submitted: Vec<(IoOp, Token)>,
    ready: VecDeque<std::result::Result<Completion, QueueError>>,
    /// Tokens handed back by `wait`, in order.
    delivered: Vec<Token>,
    capacity: usize,
    auto_close: bool,
    shut_down: bool,
}

impl MockQueue {
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// A queue that reports `Full` once `capacity` operations are in flight.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            submitted: Vec::new(),
            ready: VecDeque::new(),
            delivered: Vec::new(),
            capacity,
            auto_close: false,
            shut_down: false,
        }
    }

    /// Complete every Close with 0 as soon as it is submitted.
    pub fn auto_close(mut self) -> Self {
        self.auto_close = true;
        self
    }

    pub fn submitted(&self) -> &[(IoOp, Token)] {
        &self.submitted
    }

    /// Submissions of `kind` so far.
    pub fn count(&self, kind: EventKind) -> usize {
        self.submitted.iter().filter(|(_, t)| kind_of(*t) == Some(kind)).count()
    }

    /// Most recent token submitted for `kind` on `fd`.
    pub fn token_for(&self, kind: EventKind, fd: RawFd) -> Option<Token> {
        self.submitted
            .iter()
            .rev()
            .find(|(op, t)| kind_of(*t) == Some(kind) && op.fd() == fd)
            .map(|(_, t)| *t)
    }

    pub fn push_completion(&mut self, token: Token, result: i32) {
        self.ready.push_back(Ok(Completion { token, result }));
    }

    /// Land `payload` in the read buffer behind `token` and complete it
    /// with the number of bytes that fit.
    pub fn deliver_read(&mut self, token: Token, payload: &[u8]) {
        let iov = self
            .submitted
            .iter()
            .rev()
            .find_map(|(op, t)| match op {
                IoOp::Readv { iov, .. } if *t == token => Some(*iov),
                _ => None,
            })
            .expect("no readv submitted under this token");
        // SAFETY: the read event is still parked in its pool slot; tests
        // only deliver to reads they have not completed yet.
        let n = unsafe {
            let iov = &*iov;
            let n = payload.len().min(iov.iov_len);
            std::ptr::copy_nonoverlapping(payload.as_ptr(), iov.iov_base as *mut u8, n);
            n
        };
        self.push_completion(token, n as i32);
    }

    /// Make the next `wait` fail with EINTR.
    pub fn interrupt(&mut self) {
        self.ready.push_back(Err(QueueError::Interrupted));
    }

    /// Completions queued but not yet taken by `wait`.
    pub fn pending(&self) -> usize {
        self.ready.len()
    }

    pub fn delivered(&self) -> &[Token] {
        &self.delivered
    }
}

fn kind_of(token: Token) -> Option<EventKind> {
    token.decode().ok().map(|(kind, _)| kind)
}

impl CompletionQueue for MockQueue {
    unsafe fn submit(&mut self, op: IoOp, token: Token) -> Result<(), QueueError> {
        if self.shut_down {
            return Err(QueueError::Closed);
        }
        if self.inflight() >= self.capacity {
            return Err(QueueError::Full);
        }
        self.submitted.push((op, token));
        if self.auto_close && op.kind() == EventKind::Close {
            self.push_completion(token, 0);
        }
        Ok(())
    }

    fn wait(&mut self) -> Result<Completion, QueueError> {
        if self.shut_down {
            return Err(QueueError::Closed);
        }
        match self.ready.pop_front() {
            Some(Ok(c)) => {
                self.delivered.push(c.token);
                Ok(c)
            }
            Some(Err(e)) => Err(e),
            None => Err(QueueError::Wait(io::Error::new(
                io::ErrorKind::WouldBlock,
                "mock queue has no scripted completion",
            ))),
        }
    }

    fn inflight(&self) -> usize {
        self.submitted.len().saturating_sub(self.delivered.len())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}
