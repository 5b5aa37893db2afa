//! # mesh-core — value types and seams for the mesh node
//!
//! Everything in this crate is either a pure value (addresses, varints,
//! tokens) or a trait boundary. Nothing here owns a kernel resource; the
//! io_uring-backed implementation of [`queue::CompletionQueue`] lives in
//! `mesh-reactor`.
//!
//! ## Modules
//!
//! - `token` - Completion token: event kind + pool slot packed into `user_data`
//! - `queue` - `CompletionQueue` trait, `IoOp` and `Completion`
//! - `sockaddr` - IPv4/IPv6 socket address value with bind-ready accessors
//! - `varint` - Golang-compatible unsigned LEB128
//! - `address` - ed25519 key → mesh IPv6 address/subnet codec
//! - `env` - Environment variable helpers for configuration
//! - `error` - Error types

pub mod token;
pub mod queue;
pub mod sockaddr;
pub mod varint;
pub mod address;
pub mod env;
pub mod error;

// Re-exports for convenience
pub use token::{EventKind, Token};
pub use queue::{Completion, CompletionQueue, IoOp};
pub use sockaddr::{AddressFamily, SocketAddress};
pub use address::{MeshAddress, MeshSubnet, PublicKey};
pub use error::{CoreError, QueueError, VarintError};
pub use env::{env_get, env_get_opt};
