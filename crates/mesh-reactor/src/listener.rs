//! Listening socket setup: create, setsockopt, bind, listen.

use std::io;
use std::mem;
use std::os::fd::{FromRawFd, IntoRawFd, OwnedFd, RawFd};

use mesh_core::SocketAddress;
use tracing::debug;

use crate::error::{ReactorError, Result};

/// Open a TCP listening socket on `addr`.
///
/// Each step is checked on its own; on failure the half-built socket is
/// closed before the error is returned.
pub fn bind_listener(addr: &SocketAddress, backlog: i32) -> Result<RawFd> {
    let fd = unsafe {
        libc::socket(
            addr.family().as_raw(),
            libc::SOCK_STREAM | libc::SOCK_CLOEXEC,
            0,
        )
    };
    if fd < 0 {
        return Err(ReactorError::Socket(io::Error::last_os_error()));
    }
    // SAFETY: `fd` was just created and is owned by nobody else.
    let socket = unsafe { OwnedFd::from_raw_fd(fd) };

    let opt: libc::c_int = 1;
    let ret = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            &opt as *const libc::c_int as *const libc::c_void,
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if ret != 0 {
        return Err(ReactorError::SetOption {
            option: "SO_REUSEADDR",
            source: io::Error::last_os_error(),
        });
    }

    let ret = unsafe { libc::bind(fd, addr.as_ptr(), addr.socklen()) };
    if ret != 0 {
        return Err(ReactorError::Bind {
            addr: addr.to_string(),
            source: io::Error::last_os_error(),
        });
    }

    let ret = unsafe { libc::listen(fd, backlog) };
    if ret != 0 {
        return Err(ReactorError::Listen(io::Error::last_os_error()));
    }

    debug!(fd, %addr, backlog, "listening");
    Ok(socket.into_raw_fd())
}

/// Address the socket is actually bound to (resolves port 0).
pub fn local_addr(fd: RawFd) -> io::Result<SocketAddress> {
    // SAFETY: sockaddr_storage is plain old data; all-zero is valid.
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    let ret = unsafe {
        libc::getsockname(
            fd,
            &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr,
            &mut len,
        )
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    SocketAddress::from_storage(&storage)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "not an inet socket"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_ephemeral_v4() {
        let addr = SocketAddress::new("127.0.0.1", 0).unwrap();
        let fd = bind_listener(&addr, 5).unwrap();
        let bound = local_addr(fd).unwrap();
        assert_eq!(bound.ip(), addr.ip());
        assert_ne!(bound.port(), 0);

        // The port is taken while we listen on it.
        match bind_listener(&bound, 5) {
            Err(ReactorError::Bind { addr, source }) => {
                assert_eq!(addr, bound.to_string());
                assert_eq!(source.raw_os_error(), Some(libc::EADDRINUSE));
            }
            other => panic!("expected bind failure, got {other:?}"),
        }
        unsafe { libc::close(fd) };
    }

    #[test]
    fn test_bind_unassigned_address_fails() {
        // TEST-NET-1 is never a local address.
        let addr = SocketAddress::new("192.0.2.1", 0).unwrap();
        assert!(matches!(
            bind_listener(&addr, 5),
            Err(ReactorError::Bind { .. })
        ));
    }
}
