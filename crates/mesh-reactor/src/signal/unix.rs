//! Unix signal handlers for SIGINT/SIGTERM/SIGWINCH

use std::os::fd::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use nix::sys::eventfd::{EfdFlags, EventFd};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use tracing::debug;

use crate::error::Result;

/// Signal shared with the process-wide handler; set once installed.
static PROCESS_SIGNAL: OnceLock<ShutdownSignal> = OnceLock::new();

/// A shutdown request flag with a wake descriptor.
///
/// Clones share both. [`ShutdownSignal::new`] makes a detached signal that
/// only [`request`](ShutdownSignal::request) can raise;
/// [`install_handlers`] returns the one wired to SIGINT/SIGTERM.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    flag: AtomicBool,
    // Blocking on purpose: io_uring parks a read on it instead of
    // completing with -EAGAIN.
    wake: EventFd,
}

impl ShutdownSignal {
    pub fn new() -> Result<Self> {
        let wake = EventFd::from_flags(EfdFlags::EFD_CLOEXEC)?;
        Ok(Self {
            inner: Arc::new(Inner {
                flag: AtomicBool::new(false),
                wake,
            }),
        })
    }

    /// Ask the reactor to shut down.
    ///
    /// Async-signal-safe: an atomic store and one write(2).
    #[inline]
    pub fn request(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        // Only fails if the counter would overflow, and then it is
        // already readable.
        let _ = self.inner.wake.write(1);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Consume a pending request.
    #[inline]
    pub fn take(&self) -> bool {
        self.inner.flag.swap(false, Ordering::SeqCst)
    }

    /// Descriptor that becomes readable on every request.
    #[inline]
    pub fn wake_fd(&self) -> RawFd {
        self.inner.wake.as_raw_fd()
    }
}

extern "C" fn on_terminate(_signo: libc::c_int) {
    if let Some(signal) = PROCESS_SIGNAL.get() {
        signal.request();
    }
}

/// Route SIGINT and SIGTERM to the process shutdown signal and ignore
/// SIGWINCH.
///
/// Handlers are installed without `SA_RESTART`, so a blocked
/// `io_uring_enter` also returns EINTR. Calling this again returns the
/// same signal.
pub fn install_handlers() -> Result<ShutdownSignal> {
    let signal = match PROCESS_SIGNAL.get() {
        Some(signal) => signal.clone(),
        None => {
            let fresh = ShutdownSignal::new()?;
            PROCESS_SIGNAL.get_or_init(|| fresh).clone()
        }
    };

    let terminate = SigAction::new(
        SigHandler::Handler(on_terminate),
        SaFlags::empty(),
        SigSet::empty(),
    );
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());

    // SAFETY: the handler only does an atomic store and a write(2).
    unsafe {
        sigaction(Signal::SIGINT, &terminate)?;
        sigaction(Signal::SIGTERM, &terminate)?;
        sigaction(Signal::SIGWINCH, &ignore)?;
    }
    debug!(wake_fd = signal.wake_fd(), "signal handlers installed");

    Ok(signal)
}
