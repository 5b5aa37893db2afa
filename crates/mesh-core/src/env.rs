//! Environment variable utilities
//!
//! Generic `env_get<T>` for parsing `MESH_*` overrides with defaults.
//!
//! # Usage
//!
//! ```ignore
//! use mesh_core::env::{env_get, env_get_opt};
//!
//! let entries: u32 = env_get("MESH_QUEUE_ENTRIES", 512);
//! let backlog: Option<i32> = env_get_opt("MESH_LISTEN_BACKLOG");
//! ```

use std::str::FromStr;

/// Get environment variable parsed as type T, or return default.
///
/// Unset and unparsable values both fall back to `default`.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// `Some(T)` if the variable is set and parses.
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
