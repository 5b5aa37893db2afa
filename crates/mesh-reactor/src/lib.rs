//! # mesh-reactor — io_uring completion reactor
//!
//! Accepts inbound TCP connections for a mesh node and reads from them,
//! driven entirely by io_uring completions on a single thread.
//!
//! ```text
//!   listener ──accept──> conn fd ──readv──> data hook
//!                           │  <──readv──┘
//!                           └──(read <= 0)──> close
//! ```
//!
//! Every in-flight operation is an event parked in a fixed-size pool;
//! the completion token names the pool and slot. Closing the listening
//! socket is the one way to stop the loop.
//!
//! ## Modules
//!
//! - `reactor` - The completion loop
//! - `state` - Connection state machine and counters
//! - `event` - Accept/Read/Close events and submission
//! - `pool` - Fixed-capacity event pools
//! - `uring` - io_uring `CompletionQueue`
//! - `listener` - Listening socket setup
//! - `config` - Sizing with `MESH_*` env overrides
//! - `signal` - SIGINT/SIGTERM → shutdown flag
//! - `error` - Error types

pub mod config;
pub mod error;
pub mod event;
pub mod listener;
pub mod pool;
pub mod reactor;
pub mod signal;
pub mod state;
pub mod uring;

#[cfg(test)]
pub(crate) mod mock;

// Re-exports for convenience
pub use config::ReactorConfig;
pub use error::{ReactorError, Result};
pub use reactor::Reactor;
pub use signal::{install_handlers, ShutdownSignal};
pub use state::{ConnectionState, DataHook, Phase, Stats};
pub use uring::UringQueue;
