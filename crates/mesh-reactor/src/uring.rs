//! `UringQueue` — the io_uring-backed `CompletionQueue`.
//!
//! One ring, no SQPOLL, no fixed files, no registered buffers. Works on any
//! kernel with io_uring accept support (5.5+).
//!
//! `wait` pushes pending SQEs and blocks in a single `io_uring_enter`, then
//! moves every ready CQE into a local backlog so the CQ head advances once
//! per batch. Completions are handed out from the backlog one at a time.

use std::collections::VecDeque;
use std::io;
use std::os::fd::{AsRawFd, RawFd};

use io_uring::{opcode, squeue, types, IoUring};
use tracing::{debug, trace};

use mesh_core::{Completion, CompletionQueue, IoOp, QueueError, Token};

pub struct UringQueue {
    /// `None` once shut down.
    ring: Option<IoUring>,
    backlog: VecDeque<Completion>,
    entries: u32,
    inflight: usize,
    pending_submit: u32,
}

impl UringQueue {
    /// Create a ring with `entries` submission slots.
    pub fn new(entries: u32) -> Result<Self, QueueError> {
        let ring = IoUring::builder().build(entries).map_err(QueueError::Setup)?;
        let entries = ring.params().sq_entries();
        debug!(entries, cq_entries = ring.params().cq_entries(), "io_uring ready");

        Ok(Self {
            ring: Some(ring),
            backlog: VecDeque::with_capacity(entries as usize),
            entries,
            inflight: 0,
            pending_submit: 0,
        })
    }

    /// Ring descriptor, while the ring is alive.
    pub fn fd(&self) -> Option<RawFd> {
        self.ring.as_ref().map(|r| r.as_raw_fd())
    }

    fn build_sqe(op: &IoOp) -> squeue::Entry {
        match *op {
            IoOp::Accept {
                fd,
                addr,
                addr_len,
                flags,
            } => opcode::Accept::new(types::Fd(fd), addr, addr_len)
                .flags(flags)
                .build(),
            // Sockets ignore the offset; -1 means "current position" for files.
            IoOp::Readv { fd, iov } => opcode::Readv::new(types::Fd(fd), iov, 1)
                .offset(u64::MAX)
                .build(),
            IoOp::Close { fd } => opcode::Close::new(types::Fd(fd)).build(),
        }
    }

    /// Move every ready CQE into the backlog.
    fn reap(&mut self) -> usize {
        let Some(ring) = self.ring.as_mut() else {
            return 0;
        };
        let mut count = 0;
        for cqe in ring.completion() {
            self.backlog.push_back(Completion {
                token: Token(cqe.user_data()),
                result: cqe.result(),
            });
            count += 1;
        }
        self.inflight = self.inflight.saturating_sub(count);
        count
    }
}

impl CompletionQueue for UringQueue {
    unsafe fn submit(&mut self, op: IoOp, token: Token) -> Result<(), QueueError> {
        let ring = self.ring.as_mut().ok_or(QueueError::Closed)?;
        let sqe = Self::build_sqe(&op).user_data(token.raw());

        // SAFETY: the caller guarantees the memory behind `op` outlives the
        // operation.
        if ring.submission().push(&sqe).is_err() {
            // SQ full: hand the queued entries to the kernel and retry once.
            ring.submit().map_err(QueueError::Submit)?;
            trace!(flushed = self.pending_submit, "submission queue flushed");
            self.pending_submit = 0;
            ring.submission().push(&sqe).map_err(|_| QueueError::Full)?;
        }

        self.pending_submit += 1;
        self.inflight += 1;
        trace!(%token, fd = op.fd(), "queued");
        Ok(())
    }

    fn wait(&mut self) -> Result<Completion, QueueError> {
        loop {
            if let Some(c) = self.backlog.pop_front() {
                return Ok(c);
            }

            let ring = self.ring.as_mut().ok_or(QueueError::Closed)?;
            match ring.submit_and_wait(1) {
                Ok(_) => self.pending_submit = 0,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    return Err(QueueError::Interrupted)
                }
                Err(e) if self.pending_submit > 0 => return Err(QueueError::Submit(e)),
                Err(e) => return Err(QueueError::Wait(e)),
            }
            self.reap();
        }
    }

    fn inflight(&self) -> usize {
        self.inflight
    }

    fn capacity(&self) -> usize {
        self.entries as usize
    }

    fn shutdown(&mut self) {
        let Some(_ring) = self.ring.take() else {
            return;
        };
        debug!(
            inflight = self.inflight,
            unhandled = self.backlog.len(),
            "io_uring torn down"
        );
        self.backlog.clear();
        self.inflight = 0;
        self.pending_submit = 0;
        // Dropping the ring closes its fd and unmaps SQ/CQ.
    }

    fn is_shut_down(&self) -> bool {
        self.ring.is_none()
    }
}
