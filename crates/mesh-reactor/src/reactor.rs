//! # Reactor — the completion loop
//!
//! One thread, one queue, one state machine. Each turn:
//!
//! 1. If shutdown was requested, submit the listener Close
//! 2. Block for the next completion (flushing pending submissions)
//! 3. Hand it to [`ConnectionState::complete`], which retires the event
//!    and submits whatever comes next
//!
//! The first turn also parks a read on the shutdown wake descriptor, so a
//! request that lands between steps 1 and 2 still completes the wait. The
//! loop ends when the listener Close completes. EINTR from the wait is
//! not an error.

use std::os::fd::RawFd;

use mesh_core::{CompletionQueue, QueueError, SocketAddress};
use tracing::{info, trace};

use crate::config::ReactorConfig;
use crate::error::Result;
use crate::signal::ShutdownSignal;
use crate::state::{ConnectionState, DataHook};
use crate::uring::UringQueue;

pub struct Reactor<Q: CompletionQueue> {
    // Declared before `state`: the ring is released before the event
    // memory it may still reference.
    queue: Q,
    state: ConnectionState,
    shutdown: ShutdownSignal,
    wake_armed: bool,
}

impl Reactor<UringQueue> {
    /// io_uring-backed reactor sized from `config`.
    pub fn with_config(config: &ReactorConfig) -> Result<Self> {
        config.validate()?;
        let queue = UringQueue::new(config.queue_entries)?;
        Self::new(queue, ConnectionState::new(config))
    }
}

impl<Q: CompletionQueue> Reactor<Q> {
    pub fn new(queue: Q, state: ConnectionState) -> Result<Self> {
        Ok(Self {
            queue,
            state,
            shutdown: ShutdownSignal::new()?,
            wake_armed: false,
        })
    }

    /// Watch `signal` for shutdown requests. Call before the first turn.
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = signal;
        self
    }

    /// Bind the listening socket and arm the first Accept.
    pub fn bind(&mut self, addr: &SocketAddress) -> Result<RawFd> {
        self.state.bind_listener(&mut self.queue, addr)
    }

    /// Arm the first Accept on an already-listening socket.
    pub fn attach(&mut self, fd: RawFd) -> Result<()> {
        self.state.attach_listener(&mut self.queue, fd)
    }

    pub fn set_data_hook(&mut self, hook: DataHook) {
        self.state.set_data_hook(hook);
    }

    /// Handle to the shutdown flag this reactor watches.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Run until the listening socket is closed.
    pub fn run(&mut self) -> Result<()> {
        info!(
            listener = ?self.state.listener(),
            queue_depth = self.queue.capacity(),
            "reactor running"
        );
        while self.turn()? {}

        let stats = self.state.stats();
        info!(
            accepts = stats.accepts,
            reads = stats.reads,
            bytes_in = stats.bytes_in,
            closes = stats.closes,
            errors = stats.errors,
            "reactor stopped"
        );
        Ok(())
    }

    /// One loop iteration. Returns `false` once the reactor has ended.
    pub fn turn(&mut self) -> Result<bool> {
        if !self.state.is_enabled() {
            return Ok(false);
        }
        if !self.wake_armed {
            let fd = self.shutdown.wake_fd();
            self.state.watch_shutdown(&mut self.queue, fd)?;
            self.wake_armed = true;
        }
        if self.shutdown.take() {
            info!("shutdown requested");
            self.state.close_listener(&mut self.queue)?;
            if !self.state.is_enabled() {
                return Ok(false);
            }
        }

        match self.queue.wait() {
            Ok(completion) => self.state.complete(&mut self.queue, completion)?,
            Err(QueueError::Interrupted) => trace!("wait interrupted"),
            Err(e) => return Err(e.into()),
        }
        Ok(self.state.is_enabled())
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut Q {
        &mut self.queue
    }
}
