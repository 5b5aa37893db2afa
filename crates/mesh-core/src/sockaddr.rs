//! Bind-ready socket addresses.
//!
//! [`SocketAddress`] holds the kernel representation directly
//! (`sockaddr_in` or `sockaddr_in6`) so it can be passed to `bind(2)`
//! without conversion, while still reading back as a std IP and port.

use std::fmt;
use std::mem;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::CoreError;

/// Address family of a [`SocketAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Inet,
    Inet6,
}

impl AddressFamily {
    #[inline]
    pub fn as_raw(self) -> libc::c_int {
        match self {
            AddressFamily::Inet => libc::AF_INET,
            AddressFamily::Inet6 => libc::AF_INET6,
        }
    }
}

/// An IPv4 or IPv6 endpoint in kernel layout.
#[derive(Clone, Copy)]
pub enum SocketAddress {
    V4(libc::sockaddr_in),
    V6(libc::sockaddr_in6),
}

impl SocketAddress {
    /// Parse an IP literal. IPv4 is tried first, then IPv6.
    ///
    /// Hostnames and bracketed IPv6 (`[::1]`) are rejected.
    pub fn new(ip: &str, port: u16) -> Result<Self, CoreError> {
        if let Ok(v4) = ip.parse::<Ipv4Addr>() {
            return Ok(Self::from_v4(v4, port));
        }
        if let Ok(v6) = ip.parse::<Ipv6Addr>() {
            return Ok(Self::from_v6(v6, port));
        }
        Err(CoreError::InvalidAddress {
            ip: ip.to_string(),
            port,
        })
    }

    pub fn from_v4(ip: Ipv4Addr, port: u16) -> Self {
        // SAFETY: sockaddr_in is plain old data; all-zero is valid.
        let mut sin: libc::sockaddr_in = unsafe { mem::zeroed() };
        sin.sin_family = libc::AF_INET as libc::sa_family_t;
        sin.sin_port = port.to_be();
        sin.sin_addr.s_addr = u32::from_ne_bytes(ip.octets());
        SocketAddress::V4(sin)
    }

    pub fn from_v6(ip: Ipv6Addr, port: u16) -> Self {
        // SAFETY: sockaddr_in6 is plain old data; all-zero is valid.
        let mut sin6: libc::sockaddr_in6 = unsafe { mem::zeroed() };
        sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
        sin6.sin6_port = port.to_be();
        sin6.sin6_addr.s6_addr = ip.octets();
        SocketAddress::V6(sin6)
    }

    /// Read the peer written by `accept4` into a `sockaddr_storage`.
    ///
    /// `None` for families other than AF_INET/AF_INET6 (including the
    /// zeroed storage of a failed accept).
    pub fn from_storage(storage: &libc::sockaddr_storage) -> Option<Self> {
        let ptr = storage as *const libc::sockaddr_storage;
        match storage.ss_family as libc::c_int {
            // SAFETY: storage is large enough and suitably aligned for both
            // layouts; the family tag says which one the kernel wrote.
            libc::AF_INET => Some(SocketAddress::V4(unsafe {
                std::ptr::read(ptr as *const libc::sockaddr_in)
            })),
            libc::AF_INET6 => Some(SocketAddress::V6(unsafe {
                std::ptr::read(ptr as *const libc::sockaddr_in6)
            })),
            _ => None,
        }
    }

    #[inline]
    pub fn family(&self) -> AddressFamily {
        match self {
            SocketAddress::V4(_) => AddressFamily::Inet,
            SocketAddress::V6(_) => AddressFamily::Inet6,
        }
    }

    /// Pointer suitable for `bind(2)`; valid while `self` is.
    #[inline]
    pub fn as_ptr(&self) -> *const libc::sockaddr {
        match self {
            SocketAddress::V4(sin) => sin as *const libc::sockaddr_in as *const libc::sockaddr,
            SocketAddress::V6(sin6) => sin6 as *const libc::sockaddr_in6 as *const libc::sockaddr,
        }
    }

    /// Byte length of the active variant.
    #[inline]
    pub fn socklen(&self) -> libc::socklen_t {
        let len = match self {
            SocketAddress::V4(_) => mem::size_of::<libc::sockaddr_in>(),
            SocketAddress::V6(_) => mem::size_of::<libc::sockaddr_in6>(),
        };
        len as libc::socklen_t
    }

    pub fn ip(&self) -> IpAddr {
        match self {
            SocketAddress::V4(sin) => IpAddr::V4(Ipv4Addr::from(sin.sin_addr.s_addr.to_ne_bytes())),
            SocketAddress::V6(sin6) => IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr)),
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            SocketAddress::V4(sin) => u16::from_be(sin.sin_port),
            SocketAddress::V6(sin6) => u16::from_be(sin6.sin6_port),
        }
    }
}

impl PartialEq for SocketAddress {
    fn eq(&self, other: &Self) -> bool {
        self.family() == other.family() && self.ip() == other.ip() && self.port() == other.port()
    }
}

impl Eq for SocketAddress {}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip() {
            IpAddr::V4(ip) => write!(f, "{}:{}", ip, self.port()),
            IpAddr::V6(ip) => write!(f, "[{}]:{}", ip, self.port()),
        }
    }
}

impl fmt::Debug for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SocketAddress").field(&format_args!("{}", self)).finish()
    }
}
