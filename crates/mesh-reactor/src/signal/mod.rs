//! Signal handling for graceful shutdown
//!
//! SIGINT and SIGTERM raise a [`ShutdownSignal`]. The request sets a flag
//! and bumps an eventfd the reactor keeps a read on, so it surfaces as a
//! completion even when it lands while the loop is about to block.

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod unix;
        pub use unix::*;
    } else {
        compile_error!("mesh-reactor requires Linux (io_uring)");
    }
}
