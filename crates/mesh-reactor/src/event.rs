//! Kernel operations the reactor keeps in flight.
//!
//! An event owns every piece of memory its operation hands to the kernel
//! (peer address buffer, iovec, read buffer). Events live in an
//! [`EventPool`] slot from submission until their completion is handled,
//! and [`issue`] is the only way one is submitted.
//!
//! Equality is by descriptor: two events of the same kind on the same fd
//! are the same event as far as the state machine is concerned.

use std::mem;
use std::os::fd::RawFd;

use mesh_core::{CompletionQueue, EventKind, IoOp, SocketAddress, Token};

use crate::error::{ReactorError, Result};
use crate::pool::EventPool;

/// Bytes a single read can land.
pub const READ_BUFFER_SIZE: usize = 4096;

/// One pending kernel operation.
pub trait Event {
    const KIND: EventKind;

    fn fd(&self) -> RawFd;

    /// Describe the operation in terms of `self`'s own memory.
    ///
    /// Called after the event has reached its pool slot; the returned
    /// pointers are valid for as long as the event stays there.
    fn prepare(&mut self) -> IoOp;
}

/// Put `event` in `pool` and submit it under a token naming its slot.
///
/// If the queue rejects the submission the slot is released again, so a
/// failed issue leaves the pool as it was.
pub fn issue<E, Q>(pool: &mut EventPool<E>, queue: &mut Q, event: E) -> Result<Token>
where
    E: Event,
    Q: CompletionQueue + ?Sized,
{
    let (slot, event) = pool.insert(event)?;
    let op = event.prepare();
    let token = Token::new(E::KIND, slot);

    // SAFETY: `op` points into the pool slot, which neither moves nor is
    // reused until the completion for `token` is handled or the queue has
    // been shut down.
    if let Err(e) = unsafe { queue.submit(op, token) } {
        pool.remove(slot);
        return Err(e.into());
    }
    Ok(token)
}

/// Waits for the next inbound connection on a listening socket.
pub struct AcceptEvent {
    listener: RawFd,
    peer: libc::sockaddr_storage,
    peer_len: libc::socklen_t,
}

impl AcceptEvent {
    pub fn new(listener: RawFd) -> Self {
        Self {
            listener,
            // SAFETY: sockaddr_storage is plain old data; all-zero is valid.
            peer: unsafe { mem::zeroed() },
            peer_len: mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t,
        }
    }

    /// Remote endpoint, once the accept has completed successfully.
    pub fn peer(&self) -> Option<SocketAddress> {
        SocketAddress::from_storage(&self.peer)
    }
}

impl Event for AcceptEvent {
    const KIND: EventKind = EventKind::Accept;

    #[inline]
    fn fd(&self) -> RawFd {
        self.listener
    }

    fn prepare(&mut self) -> IoOp {
        self.peer_len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
        IoOp::Accept {
            fd: self.listener,
            addr: &mut self.peer as *mut libc::sockaddr_storage as *mut libc::sockaddr,
            addr_len: &mut self.peer_len,
            // Blocking sockets: io_uring parks the read internally, where an
            // O_NONBLOCK socket would complete with -EAGAIN.
            flags: libc::SOCK_CLOEXEC,
        }
    }
}

impl PartialEq for AcceptEvent {
    fn eq(&self, other: &Self) -> bool {
        self.listener == other.listener
    }
}

/// Reads one block from a connection into an owned buffer.
pub struct ReadEvent {
    fd: RawFd,
    len: usize,
    iov: libc::iovec,
    buf: [u8; READ_BUFFER_SIZE],
}

impl ReadEvent {
    /// A read of up to `len` bytes. Fails without touching the kernel if
    /// `len` exceeds [`READ_BUFFER_SIZE`].
    pub fn new(fd: RawFd, len: usize) -> Result<Self> {
        if len > READ_BUFFER_SIZE {
            return Err(ReactorError::Overflow {
                requested: len,
                capacity: READ_BUFFER_SIZE,
            });
        }
        Ok(Self {
            fd,
            len,
            iov: libc::iovec {
                iov_base: std::ptr::null_mut(),
                iov_len: 0,
            },
            buf: [0; READ_BUFFER_SIZE],
        })
    }

    #[inline]
    pub fn requested(&self) -> usize {
        self.len
    }

    /// The first `n` bytes the kernel delivered.
    #[inline]
    pub fn data(&self, n: usize) -> &[u8] {
        &self.buf[..n.min(self.len)]
    }
}

impl Event for ReadEvent {
    const KIND: EventKind = EventKind::Read;

    #[inline]
    fn fd(&self) -> RawFd {
        self.fd
    }

    fn prepare(&mut self) -> IoOp {
        self.iov = libc::iovec {
            iov_base: self.buf.as_mut_ptr() as *mut libc::c_void,
            iov_len: self.len,
        };
        IoOp::Readv {
            fd: self.fd,
            iov: &self.iov,
        }
    }
}

impl PartialEq for ReadEvent {
    fn eq(&self, other: &Self) -> bool {
        self.fd == other.fd
    }
}

/// Reads the 8-byte counter of the shutdown eventfd.
///
/// Stays parked in the ring while the reactor runs; a shutdown request
/// bumps the counter and completes it.
pub struct WakeEvent {
    fd: RawFd,
    iov: libc::iovec,
    counter: [u8; 8],
}

impl WakeEvent {
    pub fn new(fd: RawFd) -> Self {
        Self {
            fd,
            iov: libc::iovec {
                iov_base: std::ptr::null_mut(),
                iov_len: 0,
            },
            counter: [0; 8],
        }
    }

    /// Requests counted since the descriptor was last read.
    #[inline]
    pub fn count(&self) -> u64 {
        u64::from_ne_bytes(self.counter)
    }
}

impl Event for WakeEvent {
    const KIND: EventKind = EventKind::Wake;

    #[inline]
    fn fd(&self) -> RawFd {
        self.fd
    }

    fn prepare(&mut self) -> IoOp {
        self.iov = libc::iovec {
            iov_base: self.counter.as_mut_ptr() as *mut libc::c_void,
            iov_len: self.counter.len(),
        };
        IoOp::Readv {
            fd: self.fd,
            iov: &self.iov,
        }
    }
}

/// Closes a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseEvent {
    fd: RawFd,
}

impl CloseEvent {
    pub fn new(fd: RawFd) -> Self {
        Self { fd }
    }
}

impl Event for CloseEvent {
    const KIND: EventKind = EventKind::Close;

    #[inline]
    fn fd(&self) -> RawFd {
        self.fd
    }

    fn prepare(&mut self) -> IoOp {
        IoOp::Close { fd: self.fd }
    }
}
