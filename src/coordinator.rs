//! The handoff coordinator: the `connect`/`resume` handshake every new
//! socket goes through before an event loop (or a stream swap) begins.

use std::net::TcpStream;
use std::sync::Arc;

use log::info;
use uuid::Uuid;

use crate::connection::Connection;
use crate::driver::{BackendDriver, DriverContext, DriverFactory};
use crate::error::{Error, Result};
use crate::instruction::{read_instruction, ReadOutcome};
use crate::protocol::write_id;
use crate::registry::Registry;
use crate::stream::Stream;

/// Outcome of the handshake: either a brand-new connection whose event loop
/// the caller should now start, or a successful `resume` that has already
/// been wired into the existing connection's handoff slot (the caller has
/// nothing further to do).
pub enum Handshake {
    New {
        conn: Arc<Connection>,
        stream: Stream<TcpStream>,
        driver: Box<dyn BackendDriver>,
    },
    Resumed,
}

/// Run the handshake on a freshly-accepted socket. `lookup_driver` resolves
/// a driver name to its factory; only consulted for `connect`.
pub fn handshake(
    registry: &Arc<Registry>,
    mut stream: Stream<TcpStream>,
    driver_name: &str,
    driver_args: &[String],
    lookup_driver: impl FnOnce(&str) -> Option<DriverFactory>,
) -> Result<Handshake> {
    let instr = loop {
        match read_instruction(&mut stream)? {
            ReadOutcome::Complete(instr) => break instr,
            ReadOutcome::NeedMore => continue,
        }
    };

    match instr.opcode.as_str() {
        "connect" => connect(registry, stream, driver_name, driver_args, lookup_driver),
        "resume" => {
            let uuid_arg = instr
                .args
                .first()
                .ok_or_else(|| Error::protocol("resume missing uuid argument"))?;
            resume(registry, stream, uuid_arg)
        }
        other => Err(Error::protocol(format!("expected connect or resume, got {other}"))),
    }
}

fn connect(
    registry: &Arc<Registry>,
    mut stream: Stream<TcpStream>,
    driver_name: &str,
    driver_args: &[String],
    lookup_driver: impl FnOnce(&str) -> Option<DriverFactory>,
) -> Result<Handshake> {
    let factory = lookup_driver(driver_name).ok_or_else(|| Error::UnknownDriver(driver_name.to_string()))?;

    let conn = Connection::new();
    registry.register(conn.clone());
    write_id(&mut stream, conn.id)?;
    stream.flush()?;

    let mut driver = factory();
    let ctx = DriverContext { id: conn.id };
    if let Err(e) = driver.init(&ctx, &mut stream, driver_args) {
        registry.remove(conn.id);
        return Err(e);
    }

    info!("connection {} established ({driver_name})", conn.id);
    Ok(Handshake::New { conn, stream, driver })
}

fn resume(registry: &Arc<Registry>, new_stream: Stream<TcpStream>, uuid_arg: &str) -> Result<Handshake> {
    let bytes = decode_uuid_base64(uuid_arg).ok_or_else(|| Error::protocol("malformed resume uuid"))?;
    let id = Uuid::from_bytes(bytes);

    let conn = registry.find(id).ok_or(Error::UnknownConnection(id))?;
    info!("connection {id} resumed on a new socket");
    conn.handoff.resume(new_stream);
    Ok(Handshake::Resumed)
}

/// Minimal base64 decoder for the `resume:<base64-uuid>;` argument. The
/// encoder side never needs this (outbound UUIDs go through
/// `Stream::write_base64`), so it lives here rather than in the codec.
fn decode_uuid_base64(s: &str) -> Option<[u8; 16]> {
    fn value(c: u8) -> Option<u8> {
        Some(match c {
            b'A'..=b'Z' => c - b'A',
            b'a'..=b'z' => c - b'a' + 26,
            b'0'..=b'9' => c - b'0' + 52,
            b'+' => 62,
            b'/' => 63,
            _ => return None,
        })
    }

    let s = s.trim_end_matches('=');
    let mut out = Vec::with_capacity(16);
    let chars: Vec<u8> = s.bytes().collect();
    for chunk in chars.chunks(4) {
        let vals: Option<Vec<u8>> = chunk.iter().map(|&c| value(c)).collect();
        let vals = vals?;
        out.push((vals[0] << 2) | (vals.get(1).copied().unwrap_or(0) >> 4));
        if vals.len() > 2 {
            out.push((vals[1] << 4) | (vals[2] >> 2));
        }
        if vals.len() > 3 {
            out.push((vals[2] << 6) | vals[3]);
        }
    }
    out.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_handshake_opcode() {
        // exercised end-to-end in tests/handoff.rs; unit-level coverage of
        // the base64 uuid decoder below.
        assert!(decode_uuid_base64("not valid base64!!").is_none());
    }

    #[test]
    fn decodes_known_uuid() {
        let id = Uuid::from_bytes([0x11; 16]);
        // "EREREREREREREREREREEQ==" style encoding verified indirectly via
        // write_id/decode round trip in protocol.rs; here we just check the
        // decoder accepts its own inverse of a manually-built vector.
        let encoded = {
            use crate::stream::Stream;
            use std::os::unix::net::UnixStream;
            let (a, mut b) = UnixStream::pair().unwrap();
            let mut s = Stream::open(a);
            s.write_base64(id.as_bytes()).unwrap();
            s.flush_base64().unwrap();
            s.flush().unwrap();
            drop(s);
            use std::io::Read as _;
            let mut out = Vec::new();
            b.set_nonblocking(true).unwrap();
            let _ = b.read_to_end(&mut out);
            String::from_utf8(out).unwrap()
        };
        assert_eq!(decode_uuid_base64(&encoded).unwrap(), *id.as_bytes());
    }
}
