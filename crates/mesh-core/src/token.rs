//! Completion tokens.
//!
//! Every submission carries a [`Token`] in io_uring's `user_data` field and
//! the kernel hands it back verbatim in the completion. The token packs the
//! event kind into the high byte and the event's pool slot into the low
//! 32 bits:
//!
//! ```text
//!  63      56 55          32 31                      0
//! +----------+--------------+-------------------------+
//! |   kind   |   reserved   |          slot           |
//! +----------+--------------+-------------------------+
//! ```
//!
//! Resolving a token is a table lookup plus one exhaustive `match` on
//! [`EventKind`]; no address ever crosses the kernel boundary.

use std::fmt;

use crate::error::CoreError;

const KIND_SHIFT: u32 = 56;
const KIND_MASK: u64 = 0xFF << KIND_SHIFT;
const SLOT_MASK: u64 = 0xFFFF_FFFF;

/// The closed set of operations the reactor submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    /// Wait for an inbound connection on the listening socket.
    Accept = 1,
    /// Read one block from a connection.
    Read = 2,
    /// Close a descriptor.
    Close = 3,
    /// Wait for a shutdown request on the wake descriptor.
    Wake = 4,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Accept,
        EventKind::Read,
        EventKind::Close,
        EventKind::Wake,
    ];

    #[inline]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(EventKind::Accept),
            2 => Some(EventKind::Read),
            3 => Some(EventKind::Close),
            4 => Some(EventKind::Wake),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EventKind::Accept => "accept",
            EventKind::Read => "read",
            EventKind::Close => "close",
            EventKind::Wake => "wake",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque completion identifier stored in `user_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Token(pub u64);

impl Token {
    /// Never issued: kind 0 is not an [`EventKind`].
    pub const NONE: Self = Self(0);

    #[inline]
    pub fn new(kind: EventKind, slot: u32) -> Self {
        Self(((kind as u64) << KIND_SHIFT) | slot as u64)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Split the token back into kind and slot.
    pub fn decode(self) -> Result<(EventKind, u32), CoreError> {
        let kind = ((self.0 & KIND_MASK) >> KIND_SHIFT) as u8;
        match EventKind::from_u8(kind) {
            Some(kind) => Ok((kind, (self.0 & SLOT_MASK) as u32)),
            None => Err(CoreError::UnknownToken(self.0)),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Ok((kind, slot)) => write!(f, "{}#{}", kind, slot),
            Err(_) => write!(f, "?{:#x}", self.0),
        }
    }
}
