//! Library defaults for [`ReactorConfig`](super::ReactorConfig).

/// io_uring submission queue depth.
pub const QUEUE_ENTRIES: u32 = 512;

/// Concurrent Accept events (one is live at a time in practice).
pub const ACCEPT_CAPACITY: usize = 8;

/// Concurrent Read events; one per open connection.
pub const READ_CAPACITY: usize = 128;

/// Concurrent Close events: every open connection plus the listener.
pub const CLOSE_CAPACITY: usize = close_capacity_for(READ_CAPACITY);

/// Close pool size that covers `read_capacity` connections all hanging
/// up at once while the listener is being closed.
pub const fn close_capacity_for(read_capacity: usize) -> usize {
    read_capacity + 1
}

/// Bytes requested per read. Must not exceed the event buffer.
pub const READ_LEN: usize = crate::event::READ_BUFFER_SIZE;

/// `listen(2)` backlog.
pub const LISTEN_BACKLOG: i32 = 5;
