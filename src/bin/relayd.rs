use clap::Parser;
use color_eyre::Result;
use log::{info, warn};

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use relayd::{serve_connection, Registry};

/// Thread-per-connection daemon bridging the display protocol to a
/// statically-registered backend driver.
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Args {
    /// Port to listen for display-protocol connections on.
    #[clap(short = 'l', long, default_value_t = 4822)]
    listen_port: u16,

    /// Backend driver to use for new connections (see `relayd::drivers`).
    #[clap(short, long, default_value = "demo")]
    protocol: String,

    /// Residual arguments passed through to the driver's `init`.
    #[clap(last = true)]
    protocol_args: Vec<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let args = Args::parse();
    let registry = Registry::new();

    let addr = ("0.0.0.0", args.listen_port);
    let listener = TcpListener::bind(addr)?;
    info!("listening on {}:{} (protocol={})", addr.0, args.listen_port, args.protocol);

    for socket in listener.incoming() {
        let socket = socket?;
        socket.set_nodelay(true)?;
        let registry = registry.clone();
        let protocol = args.protocol.clone();
        let protocol_args = args.protocol_args.clone();

        thread::spawn(move || {
            let peer = socket.peer_addr().ok();
            info!("accepted connection from {peer:?}");
            serve_connection(&registry, socket, &protocol, &protocol_args);
            match peer {
                Some(addr) => info!("connection from {addr} finished"),
                None => info!("connection finished"),
            }
        });
    }

    warn!("listener loop exited");
    Ok(())
}
