//! Reactor configuration
//!
//! Library defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls (e.g. from command-line flags)
//! 2. Environment variables (`MESH_*`)
//! 3. Library defaults ([`defaults`])
//!
//! # Example
//!
//! ```rust,ignore
//! use mesh_reactor::config::ReactorConfig;
//!
//! let config = ReactorConfig::from_env()
//!     .read_capacity(256)
//!     .queue_entries(1024);
//! config.validate()?;
//! ```

pub mod defaults;

use mesh_core::env::env_get;
use tracing::info;

use crate::error::{ReactorError, Result};
use crate::event::READ_BUFFER_SIZE;

/// Reactor sizing with builder pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactorConfig {
    /// io_uring submission queue depth
    pub queue_entries: u32,
    /// Accept pool capacity
    pub accept_capacity: usize,
    /// Close pool capacity; at least `read_capacity + 1`
    pub close_capacity: usize,
    /// Read pool capacity (max concurrent connections)
    pub read_capacity: usize,
    /// Bytes requested per read
    pub read_len: usize,
    /// listen(2) backlog
    pub listen_backlog: i32,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ReactorConfig {
    /// Library defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `MESH_QUEUE_ENTRIES` - io_uring SQ depth
    /// - `MESH_ACCEPT_CAPACITY` - Accept pool size
    /// - `MESH_CLOSE_CAPACITY` - Close pool size (default follows the
    ///   read pool)
    /// - `MESH_READ_CAPACITY` - Read pool size
    /// - `MESH_READ_LEN` - Bytes per read
    /// - `MESH_LISTEN_BACKLOG` - listen(2) backlog
    pub fn from_env() -> Self {
        let read_capacity = env_get("MESH_READ_CAPACITY", defaults::READ_CAPACITY);
        Self {
            queue_entries: env_get("MESH_QUEUE_ENTRIES", defaults::QUEUE_ENTRIES),
            accept_capacity: env_get("MESH_ACCEPT_CAPACITY", defaults::ACCEPT_CAPACITY),
            close_capacity: env_get(
                "MESH_CLOSE_CAPACITY",
                defaults::close_capacity_for(read_capacity),
            ),
            read_capacity,
            read_len: env_get("MESH_READ_LEN", defaults::READ_LEN),
            listen_backlog: env_get("MESH_LISTEN_BACKLOG", defaults::LISTEN_BACKLOG),
        }
    }

    /// Library defaults only, ignoring the environment.
    pub fn new() -> Self {
        Self {
            queue_entries: defaults::QUEUE_ENTRIES,
            accept_capacity: defaults::ACCEPT_CAPACITY,
            close_capacity: defaults::CLOSE_CAPACITY,
            read_capacity: defaults::READ_CAPACITY,
            read_len: defaults::READ_LEN,
            listen_backlog: defaults::LISTEN_BACKLOG,
        }
    }

    pub fn queue_entries(mut self, n: u32) -> Self {
        self.queue_entries = n;
        self
    }

    pub fn accept_capacity(mut self, n: usize) -> Self {
        self.accept_capacity = n;
        self
    }

    pub fn close_capacity(mut self, n: usize) -> Self {
        self.close_capacity = n;
        self
    }

    /// Also grows the Close pool to cover `n` connections.
    pub fn read_capacity(mut self, n: usize) -> Self {
        self.read_capacity = n;
        self.close_capacity = self
            .close_capacity
            .max(defaults::close_capacity_for(n));
        self
    }

    pub fn read_len(mut self, n: usize) -> Self {
        self.read_len = n;
        self
    }

    pub fn listen_backlog(mut self, n: i32) -> Self {
        self.listen_backlog = n;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.queue_entries == 0 {
            return Err(ReactorError::Config("queue_entries must be > 0"));
        }
        if self.accept_capacity == 0 {
            return Err(ReactorError::Config("accept_capacity must be > 0"));
        }
        if self.close_capacity == 0 {
            return Err(ReactorError::Config("close_capacity must be > 0"));
        }
        if self.read_capacity == 0 {
            return Err(ReactorError::Config("read_capacity must be > 0"));
        }
        if self.close_capacity < defaults::close_capacity_for(self.read_capacity) {
            return Err(ReactorError::Config(
                "close_capacity must cover every connection plus the listener",
            ));
        }
        if self.read_len == 0 {
            return Err(ReactorError::Config("read_len must be > 0"));
        }
        if self.read_len > READ_BUFFER_SIZE {
            return Err(ReactorError::Config("read_len exceeds the read buffer"));
        }
        if self.listen_backlog <= 0 {
            return Err(ReactorError::Config("listen_backlog must be > 0"));
        }
        Ok(())
    }

    /// Log the effective configuration.
    pub fn log_summary(&self) {
        info!(
            queue_entries = self.queue_entries,
            accept_capacity = self.accept_capacity,
            close_capacity = self.close_capacity,
            read_capacity = self.read_capacity,
            read_len = self.read_len,
            listen_backlog = self.listen_backlog,
            "reactor configuration"
        );
    }
}
