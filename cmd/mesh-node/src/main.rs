//! mesh-node — inbound listener for a mesh node
//!
//! Binds a TCP listener, accepts peers and reads from them over io_uring on
//! a single thread. Each block read is checked for a varint frame header.
//!
//! Usage:
//!   mesh-node [--bind 127.0.0.1] [--port 5555] [--log-level info]
//!
//! Environment:
//!   MESH_LOG_LEVEL      log level when --log-level is not given
//!   MESH_QUEUE_ENTRIES  io_uring depth (default 512)
//!   MESH_READ_CAPACITY  max concurrent connections (default 128)
//!   MESH_READ_LEN       bytes per read (default 4096)
//!
//! SIGINT/SIGTERM close the listening socket and stop the node.

use std::os::fd::RawFd;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info, trace, Level};
use tracing_subscriber::FmtSubscriber;

use mesh_core::varint;
use mesh_core::SocketAddress;
use mesh_reactor::{install_handlers, Reactor, ReactorConfig, ReactorError};

/// Mesh node inbound listener.
#[derive(Parser, Debug)]
#[command(name = "mesh-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// IP literal to listen on (IPv4 or IPv6, no brackets)
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// TCP port to listen on
    #[arg(short, long, default_value_t = 5555)]
    port: u16,

    /// Log level
    #[arg(long, env = "MESH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Max concurrent connections (overrides MESH_READ_CAPACITY)
    #[arg(long)]
    read_capacity: Option<usize>,

    /// io_uring submission queue depth (overrides MESH_QUEUE_ENTRIES)
    #[arg(long)]
    queue_entries: Option<u32>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("mesh-node: logging setup failed: {e}");
        return ExitCode::FAILURE;
    }

    info!("Starting mesh-node v{}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(()) => {
            info!("mesh-node: done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "mesh-node: fatal");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ReactorError> {
    let mut config = ReactorConfig::from_env();
    if let Some(n) = args.read_capacity {
        config = config.read_capacity(n);
    }
    if let Some(n) = args.queue_entries {
        config = config.queue_entries(n);
    }
    config.validate()?;
    config.log_summary();

    let addr = SocketAddress::new(&args.bind, args.port)?;
    let shutdown = install_handlers()?;

    let mut reactor = Reactor::with_config(&config)?.with_shutdown(shutdown);
    reactor.set_data_hook(Box::new(inspect_block));
    reactor.bind(&addr)?;
    info!(%addr, "accepting peers");

    reactor.run()
}

/// Peers open with a varint-length-prefixed frame; log what arrives.
fn inspect_block(fd: RawFd, data: &[u8]) {
    match varint::decode(data) {
        Ok((frame_len, header_len)) => debug!(
            fd,
            frame_len,
            header_len,
            bytes = data.len(),
            "inbound block"
        ),
        Err(e) => trace!(fd, error = %e, bytes = data.len(), "inbound block without frame header"),
    }
}
