//! Connection state machine.
//!
//! `ConnectionState` owns the three event pools and decides what to submit
//! next whenever a completion comes back:
//!
//! ```text
//!            accept ok                 read <= 0          close done
//! (listener) ─────────> Reading ─────────────────> Closing ──────────> gone
//!                        │  ^
//!                        └──┘ read > 0
//! ```
//!
//! The listening socket has its own lane: one Accept is always in flight
//! until [`close_listener`](ConnectionState::close_listener) is called, and
//! the completion of the listener's Close is what ends the reactor. A
//! third lane holds the read on the shutdown wake descriptor; when it
//! completes the listener is closed.

use std::io;
use std::os::fd::RawFd;

use mesh_core::{Completion, CompletionQueue, EventKind, SocketAddress};
use tracing::{debug, info, trace, warn};

use crate::config::ReactorConfig;
use crate::error::Result;
use crate::event::{issue, AcceptEvent, CloseEvent, Event, ReadEvent, WakeEvent};
use crate::listener;
use crate::pool::EventPool;

/// Receives every block read from a connection.
pub type DataHook = Box<dyn FnMut(RawFd, &[u8])>;

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reading,
    Closing,
}

/// Counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub accepts: u64,
    pub reads: u64,
    pub bytes_in: u64,
    pub closes: u64,
    pub errors: u64,
}

pub struct ConnectionState {
    listener: Option<RawFd>,
    listener_closing: bool,
    enabled: bool,
    read_len: usize,
    backlog: i32,
    accepting: EventPool<AcceptEvent>,
    reading: EventPool<ReadEvent>,
    closing: EventPool<CloseEvent>,
    waking: EventPool<WakeEvent>,
    stats: Stats,
    data_hook: Option<DataHook>,
}

impl ConnectionState {
    /// Empty state sized from `config`. Nothing is submitted until a
    /// listener is bound.
    pub fn new(config: &ReactorConfig) -> Self {
        Self {
            listener: None,
            listener_closing: false,
            enabled: true,
            read_len: config.read_len,
            backlog: config.listen_backlog,
            accepting: EventPool::new(config.accept_capacity),
            reading: EventPool::new(config.read_capacity),
            closing: EventPool::new(config.close_capacity),
            waking: EventPool::new(1),
            stats: Stats::default(),
            data_hook: None,
        }
    }

    /// Install the consumer for inbound bytes, replacing any previous one.
    pub fn set_data_hook(&mut self, hook: DataHook) {
        self.data_hook = Some(hook);
    }

    /// Open a listening socket on `addr` and start accepting on it.
    pub fn bind_listener<Q>(&mut self, queue: &mut Q, addr: &SocketAddress) -> Result<RawFd>
    where
        Q: CompletionQueue + ?Sized,
    {
        let fd = listener::bind_listener(addr, self.backlog)?;
        info!(fd, %addr, "listening socket bound");
        self.attach_listener(queue, fd)?;
        Ok(fd)
    }

    /// Start accepting on an already-listening socket.
    pub fn attach_listener<Q>(&mut self, queue: &mut Q, fd: RawFd) -> Result<()>
    where
        Q: CompletionQueue + ?Sized,
    {
        self.listener = Some(fd);
        self.listener_closing = false;
        self.issue_accept(queue)
    }

    /// Begin graceful shutdown by closing the listening socket.
    ///
    /// Returns once the Close is submitted; the reactor ends when it
    /// completes. Repeated calls are ignored. With no listener bound the
    /// reactor ends immediately.
    pub fn close_listener<Q>(&mut self, queue: &mut Q) -> Result<()>
    where
        Q: CompletionQueue + ?Sized,
    {
        if !self.enabled {
            return Ok(());
        }
        let Some(fd) = self.listener else {
            self.end(queue);
            return Ok(());
        };
        if self.listener_closing {
            debug!(fd, "listener close already in flight");
            return Ok(());
        }
        self.listener_closing = true;
        info!(fd, "closing listening socket");
        self.issue_close(queue, fd)
    }

    /// Keep a read on the shutdown wake descriptor `fd` in flight.
    ///
    /// A no-op while one is already parked or once the listener is closing.
    pub fn watch_shutdown<Q>(&mut self, queue: &mut Q, fd: RawFd) -> Result<()>
    where
        Q: CompletionQueue + ?Sized,
    {
        if !self.enabled || self.listener_closing || !self.waking.is_empty() {
            return Ok(());
        }
        issue(&mut self.waking, queue, WakeEvent::new(fd))?;
        trace!(fd, "watching for shutdown");
        Ok(())
    }

    /// Route one completion to its handler.
    ///
    /// Completions arriving after the reactor has ended are ignored.
    pub fn complete<Q>(&mut self, queue: &mut Q, completion: Completion) -> Result<()>
    where
        Q: CompletionQueue + ?Sized,
    {
        if !self.enabled {
            return Ok(());
        }
        let (kind, slot) = match completion.token.decode() {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, "dropping completion");
                self.stats.errors += 1;
                return Ok(());
            }
        };
        trace!(token = %completion.token, result = completion.result, "completion");

        match kind {
            EventKind::Accept => self.on_accept(queue, slot, completion.result),
            EventKind::Read => self.on_read(queue, slot, completion.result),
            EventKind::Close => self.on_close(queue, slot, completion.result),
            EventKind::Wake => self.on_wake(queue, slot, completion.result),
        }
    }

    fn on_accept<Q>(&mut self, queue: &mut Q, slot: u32, result: i32) -> Result<()>
    where
        Q: CompletionQueue + ?Sized,
    {
        let Some(accept) = self.accepting.get(slot) else {
            return self.stale(EventKind::Accept, slot);
        };

        if result >= 0 {
            let fd = result;
            self.stats.accepts += 1;
            match accept.peer() {
                Some(peer) => debug!(fd, %peer, "accepted connection"),
                None => debug!(fd, "accepted connection"),
            }
            self.issue_read(queue, fd)?;
        } else {
            self.stats.errors += 1;
            warn!(error = %io::Error::from_raw_os_error(-result), "accept failed");
        }

        self.accepting.remove(slot);
        if !self.listener_closing {
            self.issue_accept(queue)?;
        }
        Ok(())
    }

    fn on_read<Q>(&mut self, queue: &mut Q, slot: u32, result: i32) -> Result<()>
    where
        Q: CompletionQueue + ?Sized,
    {
        let Some(read) = self.reading.get(slot) else {
            return self.stale(EventKind::Read, slot);
        };
        let fd = read.fd();

        if result > 0 {
            let n = result as usize;
            self.stats.reads += 1;
            self.stats.bytes_in += n as u64;
            trace!(fd, bytes = n, "read");
            if let Some(hook) = self.data_hook.as_mut() {
                hook(fd, read.data(n));
            }
            self.reading.remove(slot);
            self.issue_read(queue, fd)
        } else {
            if result < 0 {
                self.stats.errors += 1;
                debug!(fd, error = %io::Error::from_raw_os_error(-result), "read failed");
            } else {
                debug!(fd, "peer closed");
            }
            // Close first: if it cannot be issued the fd stays tracked as
            // reading and `end` still closes it.
            self.issue_close(queue, fd)?;
            self.reading.remove(slot);
            Ok(())
        }
    }

    fn on_close<Q>(&mut self, queue: &mut Q, slot: u32, result: i32) -> Result<()>
    where
        Q: CompletionQueue + ?Sized,
    {
        let Some(close) = self.closing.remove(slot) else {
            return self.stale(EventKind::Close, slot);
        };
        let fd = close.fd();

        if result < 0 {
            self.stats.errors += 1;
            warn!(fd, error = %io::Error::from_raw_os_error(-result), "close failed");
        }

        if Some(fd) == self.listener {
            info!(fd, "listening socket closed");
            self.end(queue);
        } else {
            self.stats.closes += 1;
            debug!(fd, "connection closed");
        }
        Ok(())
    }

    fn on_wake<Q>(&mut self, queue: &mut Q, slot: u32, result: i32) -> Result<()>
    where
        Q: CompletionQueue + ?Sized,
    {
        let Some(wake) = self.waking.remove(slot) else {
            return self.stale(EventKind::Wake, slot);
        };

        if result < 0 {
            // Not re-armed; the loop still checks the flag every turn.
            self.stats.errors += 1;
            warn!(
                fd = wake.fd(),
                error = %io::Error::from_raw_os_error(-result),
                "shutdown wake read failed"
            );
            return Ok(());
        }
        info!(requests = wake.count(), "shutdown requested");
        self.close_listener(queue)
    }

    fn stale(&mut self, kind: EventKind, slot: u32) -> Result<()> {
        warn!(%kind, slot, "completion for an empty slot");
        self.stats.errors += 1;
        Ok(())
    }

    /// Submit a fresh Accept on the listening socket.
    pub fn issue_accept<Q>(&mut self, queue: &mut Q) -> Result<()>
    where
        Q: CompletionQueue + ?Sized,
    {
        let Some(fd) = self.listener else {
            return Ok(());
        };
        issue(&mut self.accepting, queue, AcceptEvent::new(fd))?;
        Ok(())
    }

    /// Submit a Read of the configured length on `fd`.
    pub fn issue_read<Q>(&mut self, queue: &mut Q, fd: RawFd) -> Result<()>
    where
        Q: CompletionQueue + ?Sized,
    {
        let read = ReadEvent::new(fd, self.read_len)?;
        issue(&mut self.reading, queue, read)?;
        Ok(())
    }

    /// Submit a Close on `fd`.
    pub fn issue_close<Q>(&mut self, queue: &mut Q, fd: RawFd) -> Result<()>
    where
        Q: CompletionQueue + ?Sized,
    {
        issue(&mut self.closing, queue, CloseEvent::new(fd))?;
        Ok(())
    }

    /// Stop the reactor: release the kernel queue, then close whatever
    /// connections are still open.
    fn end<Q>(&mut self, queue: &mut Q)
    where
        Q: CompletionQueue + ?Sized,
    {
        self.enabled = false;
        self.listener = None;
        queue.shutdown();

        // With the ring gone the kernel holds no more pointers into the
        // pools. Connections still reading are open; close them here.
        // Pending Closes may or may not have run, so they are dropped.
        let open = self.reading.drain();
        for read in &open {
            unsafe { libc::close(read.fd()) };
        }
        let dropped = self.accepting.drain().len()
            + self.closing.drain().len()
            + self.waking.drain().len();
        info!(closed = open.len(), dropped, "reactor ended");
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn listener(&self) -> Option<RawFd> {
        self.listener
    }

    #[inline]
    pub fn is_listener_closing(&self) -> bool {
        self.listener_closing
    }

    /// Lifecycle phase of connection `fd`, if it is still tracked.
    pub fn phase_of(&self, fd: RawFd) -> Option<Phase> {
        if self.closing.find_fd(fd).is_some() {
            Some(Phase::Closing)
        } else if self.reading.find_fd(fd).is_some() {
            Some(Phase::Reading)
        } else {
            None
        }
    }

    #[inline]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Whether a read on the wake descriptor is in flight.
    #[inline]
    pub fn is_watching_shutdown(&self) -> bool {
        !self.waking.is_empty()
    }

    /// Live events per kind: (accept, read, close).
    pub fn live(&self) -> (usize, usize, usize) {
        (self.accepting.len(), self.reading.len(), self.closing.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactorError;
    use crate::mock::MockQueue;
    use mesh_core::{QueueError, Token};
    use std::cell::RefCell;
    use std::rc::Rc;

    // Fake descriptors, far above anything the test process has open.
    const LISTENER: RawFd = 70_100;
    const CONN: RawFd = 70_101;

    fn setup(config: ReactorConfig) -> (ConnectionState, MockQueue) {
        let mut state = ConnectionState::new(&config);
        let mut queue = MockQueue::new();
        state.attach_listener(&mut queue, LISTENER).unwrap();
        (state, queue)
    }

    fn accept(state: &mut ConnectionState, queue: &mut MockQueue, fd: RawFd) {
        let token = queue.token_for(EventKind::Accept, LISTENER).unwrap();
        queue.push_completion(token, fd);
        let c = queue.wait().unwrap();
        state.complete(queue, c).unwrap();
    }

    fn step(state: &mut ConnectionState, queue: &mut MockQueue) -> Result<()> {
        let c = queue.wait().unwrap();
        state.complete(queue, c)
    }

    #[test]
    fn test_bind_issues_one_accept() {
        let (state, queue) = setup(ReactorConfig::new());
        assert_eq!(queue.count(EventKind::Accept), 1);
        assert_eq!(state.live(), (1, 0, 0));
        assert_eq!(state.listener(), Some(LISTENER));
        assert!(state.is_enabled());
    }

    #[test]
    fn test_connection_lifecycle() {
        let (mut state, mut queue) = setup(ReactorConfig::new());

        let seen: Rc<RefCell<Vec<(RawFd, Vec<u8>)>>> = Rc::default();
        let sink = Rc::clone(&seen);
        state.set_data_hook(Box::new(move |fd: RawFd, data: &[u8]| {
            sink.borrow_mut().push((fd, data.to_vec()))
        }));

        // Accept: one Read for the new fd, and a fresh Accept.
        accept(&mut state, &mut queue, CONN);
        assert_eq!(queue.count(EventKind::Accept), 2);
        assert_eq!(queue.count(EventKind::Read), 1);
        assert_eq!(state.phase_of(CONN), Some(Phase::Reading));
        assert_eq!(state.live(), (1, 1, 0));

        // Read 42 bytes: hook sees them, a new Read is armed.
        let payload: Vec<u8> = (0..42).collect();
        let read = queue.token_for(EventKind::Read, CONN).unwrap();
        queue.deliver_read(read, &payload);
        step(&mut state, &mut queue).unwrap();
        assert_eq!(queue.count(EventKind::Read), 2);
        assert_eq!(state.phase_of(CONN), Some(Phase::Reading));
        assert_eq!(seen.borrow().as_slice(), &[(CONN, payload.clone())]);

        // Read 0: peer hung up, Close issued.
        let read = queue.token_for(EventKind::Read, CONN).unwrap();
        queue.push_completion(read, 0);
        step(&mut state, &mut queue).unwrap();
        assert_eq!(queue.count(EventKind::Close), 1);
        assert_eq!(state.phase_of(CONN), Some(Phase::Closing));
        assert_eq!(state.live(), (1, 0, 1));

        // Close done: fd forgotten, reactor still running.
        let close = queue.token_for(EventKind::Close, CONN).unwrap();
        queue.push_completion(close, 0);
        step(&mut state, &mut queue).unwrap();
        assert_eq!(state.phase_of(CONN), None);
        assert_eq!(state.live(), (1, 0, 0));
        assert!(state.is_enabled());

        let stats = state.stats();
        assert_eq!(stats.accepts, 1);
        assert_eq!(stats.reads, 1);
        assert_eq!(stats.bytes_in, 42);
        assert_eq!(stats.closes, 1);
        assert_eq!(stats.errors, 0);
    }

    #[test]
    fn test_read_error_closes() {
        let (mut state, mut queue) = setup(ReactorConfig::new());
        accept(&mut state, &mut queue, CONN);

        let read = queue.token_for(EventKind::Read, CONN).unwrap();
        queue.push_completion(read, -libc::ECONNRESET);
        step(&mut state, &mut queue).unwrap();
        assert_eq!(state.phase_of(CONN), Some(Phase::Closing));
        assert_eq!(state.stats().errors, 1);
    }

    #[test]
    fn test_failed_accept_rearms_without_read() {
        let (mut state, mut queue) = setup(ReactorConfig::new());
        accept(&mut state, &mut queue, -libc::EMFILE);

        assert_eq!(queue.count(EventKind::Read), 0);
        assert_eq!(queue.count(EventKind::Accept), 2);
        assert_eq!(state.live(), (1, 0, 0));
        assert_eq!(state.stats().accepts, 0);
        assert_eq!(state.stats().errors, 1);
    }

    #[test]
    fn test_listener_close_ends_reactor() {
        let (mut state, mut queue) = setup(ReactorConfig::new());

        state.close_listener(&mut queue).unwrap();
        assert!(state.is_listener_closing());
        // Second request is a no-op.
        state.close_listener(&mut queue).unwrap();
        assert_eq!(queue.count(EventKind::Close), 1);

        // The outstanding Accept fails once the socket is gone; no re-arm.
        let accept = queue.token_for(EventKind::Accept, LISTENER).unwrap();
        queue.push_completion(accept, -libc::ECANCELED);
        step(&mut state, &mut queue).unwrap();
        assert_eq!(queue.count(EventKind::Accept), 1);

        let close = queue.token_for(EventKind::Close, LISTENER).unwrap();
        queue.push_completion(close, 0);
        step(&mut state, &mut queue).unwrap();

        assert!(!state.is_enabled());
        assert!(queue.is_shut_down());
        assert_eq!(state.listener(), None);
        assert_eq!(state.live(), (0, 0, 0));
        // Listener close is not a connection close.
        assert_eq!(state.stats().closes, 0);
    }

    #[test]
    fn test_end_drains_open_connections() {
        let (mut state, mut queue) = setup(ReactorConfig::new());
        accept(&mut state, &mut queue, CONN);
        accept(&mut state, &mut queue, CONN + 1);
        assert_eq!(state.live(), (1, 2, 0));

        state.close_listener(&mut queue).unwrap();
        let close = queue.token_for(EventKind::Close, LISTENER).unwrap();
        queue.push_completion(close, 0);
        step(&mut state, &mut queue).unwrap();

        assert!(!state.is_enabled());
        assert_eq!(state.live(), (0, 0, 0));
        assert_eq!(state.phase_of(CONN), None);
    }

    #[test]
    fn test_completions_ignored_after_end() {
        let (mut state, mut queue) = setup(ReactorConfig::new());
        state.close_listener(&mut queue).unwrap();
        let close = queue.token_for(EventKind::Close, LISTENER).unwrap();
        queue.push_completion(close, 0);
        step(&mut state, &mut queue).unwrap();

        let before = state.stats().clone();
        let stray = Completion {
            token: Token::new(EventKind::Accept, 0),
            result: CONN,
        };
        state.complete(&mut queue, stray).unwrap();
        assert_eq!(state.stats(), &before);
        assert_eq!(state.live(), (0, 0, 0));
    }

    #[test]
    fn test_unknown_and_stale_tokens_are_skipped() {
        let (mut state, mut queue) = setup(ReactorConfig::new());
        let bogus = Completion {
            token: Token(0xEE << 56),
            result: 0,
        };
        state.complete(&mut queue, bogus).unwrap();

        let stale = Completion {
            token: Token::new(EventKind::Read, 5),
            result: 10,
        };
        state.complete(&mut queue, stale).unwrap();

        assert_eq!(state.stats().errors, 2);
        assert_eq!(state.live(), (1, 0, 0));
        assert_eq!(queue.submitted().len(), 1);
    }

    #[test]
    fn test_every_connection_hangs_up_at_once() {
        let config = ReactorConfig::new().read_capacity(16);
        let (mut state, mut queue) = setup(config);
        let conns: Vec<RawFd> = (0..16).map(|i| CONN + i).collect();
        for &fd in &conns {
            accept(&mut state, &mut queue, fd);
        }
        assert_eq!(state.live(), (1, 16, 0));

        // All hang-ups are reaped in one batch, then shutdown arrives
        // before any Close has completed.
        for &fd in &conns {
            let read = queue.token_for(EventKind::Read, fd).unwrap();
            queue.push_completion(read, 0);
        }
        for _ in &conns {
            step(&mut state, &mut queue).unwrap();
        }
        state.close_listener(&mut queue).unwrap();

        assert_eq!(state.live(), (1, 0, 17));
        assert!(conns
            .iter()
            .all(|&fd| state.phase_of(fd) == Some(Phase::Closing)));
    }

    #[test]
    fn test_failed_close_keeps_connection_reading() {
        let mut config = ReactorConfig::new().read_capacity(2);
        config.close_capacity = 1;
        let (mut state, mut queue) = setup(config);
        accept(&mut state, &mut queue, CONN);
        accept(&mut state, &mut queue, CONN + 1);

        for fd in [CONN, CONN + 1] {
            let read = queue.token_for(EventKind::Read, fd).unwrap();
            queue.push_completion(read, 0);
        }
        step(&mut state, &mut queue).unwrap();
        assert!(matches!(
            step(&mut state, &mut queue),
            Err(ReactorError::PoolExhausted { kind: EventKind::Close, .. })
        ));

        // Still tracked, so teardown closes it.
        assert_eq!(state.phase_of(CONN + 1), Some(Phase::Reading));
        assert_eq!(state.live(), (1, 1, 1));
    }

    #[test]
    fn test_wake_completion_closes_listener() {
        const WAKE: RawFd = 70_190;
        let (mut state, mut queue) = setup(ReactorConfig::new());
        state.watch_shutdown(&mut queue, WAKE).unwrap();
        state.watch_shutdown(&mut queue, WAKE).unwrap();
        assert_eq!(queue.count(EventKind::Wake), 1);
        assert!(state.is_watching_shutdown());

        let wake = queue.token_for(EventKind::Wake, WAKE).unwrap();
        queue.push_completion(wake, 8);
        step(&mut state, &mut queue).unwrap();

        assert!(state.is_listener_closing());
        assert!(!state.is_watching_shutdown());
        assert_eq!(queue.count(EventKind::Close), 1);
        assert!(queue.token_for(EventKind::Close, LISTENER).is_some());

        // Not re-armed once the listener is on its way out.
        state.watch_shutdown(&mut queue, WAKE).unwrap();
        assert_eq!(queue.count(EventKind::Wake), 1);
    }

    #[test]
    fn test_failed_wake_read_is_not_a_shutdown() {
        const WAKE: RawFd = 70_191;
        let (mut state, mut queue) = setup(ReactorConfig::new());
        state.watch_shutdown(&mut queue, WAKE).unwrap();

        let wake = queue.token_for(EventKind::Wake, WAKE).unwrap();
        queue.push_completion(wake, -libc::EBADF);
        step(&mut state, &mut queue).unwrap();

        assert!(!state.is_listener_closing());
        assert_eq!(state.stats().errors, 1);
        assert_eq!(queue.count(EventKind::Close), 0);
    }

    #[test]
    fn test_read_pool_exhaustion_is_fatal() {
        let (mut state, mut queue) = setup(ReactorConfig::new().read_capacity(1));
        accept(&mut state, &mut queue, CONN);

        let token = queue.token_for(EventKind::Accept, LISTENER).unwrap();
        queue.push_completion(token, CONN + 1);
        match step(&mut state, &mut queue) {
            Err(ReactorError::PoolExhausted { kind, capacity }) => {
                assert_eq!(kind, EventKind::Read);
                assert_eq!(capacity, 1);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(state.live().1, 1);
    }

    #[test]
    fn test_oversized_read_submits_nothing() {
        let config = ReactorConfig::new().read_len(crate::event::READ_BUFFER_SIZE + 1);
        let (mut state, mut queue) = setup(config);

        let token = queue.token_for(EventKind::Accept, LISTENER).unwrap();
        queue.push_completion(token, CONN);
        assert!(matches!(
            step(&mut state, &mut queue),
            Err(ReactorError::Overflow { .. })
        ));
        assert_eq!(queue.count(EventKind::Read), 0);
        assert_eq!(state.live().1, 0);
    }

    #[test]
    fn test_full_queue_propagates() {
        let mut state = ConnectionState::new(&ReactorConfig::new());
        let mut queue = MockQueue::with_capacity(0);
        assert!(matches!(
            state.attach_listener(&mut queue, LISTENER),
            Err(ReactorError::Queue(QueueError::Full))
        ));
        assert_eq!(state.live(), (0, 0, 0));
    }

    #[test]
    fn test_close_without_listener_ends() {
        let mut state = ConnectionState::new(&ReactorConfig::new());
        let mut queue = MockQueue::new();
        state.close_listener(&mut queue).unwrap();
        assert!(!state.is_enabled());
        assert!(queue.is_shut_down());
        assert!(queue.submitted().is_empty());
    }

    #[test]
    fn test_bind_real_listener() {
        let mut state = ConnectionState::new(&ReactorConfig::new());
        let mut queue = MockQueue::new();
        let addr = SocketAddress::new("127.0.0.1", 0).unwrap();
        let fd = state.bind_listener(&mut queue, &addr).unwrap();

        assert_eq!(state.listener(), Some(fd));
        assert_eq!(queue.count(EventKind::Accept), 1);
        assert!(queue.token_for(EventKind::Accept, fd).is_some());
        unsafe { libc::close(fd) };
    }
}
