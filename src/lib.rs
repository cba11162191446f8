#![allow(clippy::too_many_arguments)]

pub mod connection;
pub mod coordinator;
pub mod driver;
pub mod drivers;
pub mod error;
pub mod eventloop;
pub mod handoff;
pub mod instruction;
pub mod protocol;
pub mod registry;
pub mod stream;

pub use connection::Connection;
pub use driver::{BackendDriver, DriverContext, DriverFactory, MouseButtons};
pub use error::{Error, Result};
pub use registry::Registry;
pub use stream::Stream;

use std::net::TcpStream;
use std::sync::Arc;

use log::{info, warn};

/// Run the connection-handling engine for one freshly-accepted socket: the
/// `connect`/`resume` handshake, and for a `connect`, the event loop until
/// the connection terminates.
///
/// Runs to completion on the calling thread; callers wanting the
/// one-thread-per-connection model spawn this inside `thread::spawn`.
pub fn serve_connection(
    registry: &Arc<Registry>,
    socket: TcpStream,
    driver_name: &str,
    driver_args: &[String],
) {
    let stream = Stream::open(socket);
    match coordinator::handshake(registry, stream, driver_name, driver_args, drivers::lookup) {
        Ok(coordinator::Handshake::New { conn, stream, driver }) => {
            info!("connection {} entering event loop", conn.id);
            eventloop::run(registry, conn, stream, driver);
        }
        Ok(coordinator::Handshake::Resumed) => {
            info!("socket handed off to an existing connection's event loop");
        }
        Err(e) => {
            warn!("handshake failed: {e}");
        }
    }
}
