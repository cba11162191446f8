//! Per-connection event loop.
//!
//! One iteration: adopt a pending stream swap, let the backend push a batch
//! of frame updates, then drain and dispatch zero or more complete inbound
//! instructions. Runs on its own OS thread for the connection's lifetime,
//! one thread per connection, generalized from a single fixed protocol to
//! any `BackendDriver`.

use std::net::TcpStream;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::connection::Connection;
use crate::driver::{BackendDriver, DriverContext, MouseButtons};
use crate::error::{Error, Result};
use crate::instruction::{read_instruction, unescape, Instruction, ReadOutcome};
use crate::registry::Registry;
use crate::stream::{SelectResult, Stream};

/// Drive `conn` until `disconnect`, a fatal handler return, or a transport
/// error, then run the teardown sequence (`free`, registry removal, stream
/// drop) unconditionally.
pub fn run(
    registry: &Arc<Registry>,
    conn: Arc<Connection>,
    mut stream: Stream<TcpStream>,
    mut driver: Box<dyn BackendDriver>,
) {
    let ctx = DriverContext { id: conn.id };
    let result = drive(&conn, &ctx, &mut stream, driver.as_mut());

    if let Err(e) = &result {
        warn!("connection {} terminating: {e}", ctx.id);
    } else {
        debug!("connection {} terminating normally", ctx.id);
    }

    driver.free(&ctx);
    registry.remove(conn.id);
}

fn drive(
    conn: &Arc<Connection>,
    ctx: &DriverContext,
    stream: &mut Stream<TcpStream>,
    driver: &mut dyn BackendDriver,
) -> Result<()> {
    loop {
        if let Some(new_stream) = conn.handoff.take_pending() {
            info!("connection {} adopting resumed stream", ctx.id);
            *stream = new_stream;
        }

        driver.handle_messages(ctx, stream)?;
        stream.flush()?;

        match stream.instructions_waiting()? {
            SelectResult::Timeout => continue,
            SelectResult::Ready => {}
        }

        loop {
            match read_instruction(stream)? {
                ReadOutcome::NeedMore => break,
                ReadOutcome::Complete(instr) => {
                    if dispatch(conn, ctx, stream, driver, instr)? {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Returns `Ok(true)` if the loop should terminate (a `disconnect`).
fn dispatch(
    conn: &Arc<Connection>,
    ctx: &DriverContext,
    stream: &mut Stream<TcpStream>,
    driver: &mut dyn BackendDriver,
    instr: Instruction,
) -> Result<bool> {
    match instr.opcode.as_str() {
        "mouse" => {
            let [x, y, mask] = parse_args::<3>(&instr.args)?;
            driver.mouse(ctx, stream, x as i32, y as i32, MouseButtons::from_bits_truncate(mask as u8))?;
            Ok(false)
        }
        "key" => {
            let [keysym, pressed] = parse_args::<2>(&instr.args)?;
            driver.key(ctx, stream, keysym, pressed != 0)?;
            Ok(false)
        }
        "clipboard" => {
            let text = instr.args.first().ok_or_else(|| Error::protocol("clipboard missing argument"))?;
            driver.clipboard(ctx, stream, &unescape(text))?;
            Ok(false)
        }
        "pause" => {
            conn.handoff.pause();
            Ok(false)
        }
        "disconnect" => Ok(true),
        other => Err(Error::protocol(format!("unexpected opcode during session: {other}"))),
    }
}

fn parse_args<const N: usize>(args: &[String]) -> Result<[i64; N]> {
    if args.len() < N {
        return Err(Error::protocol(format!("expected {N} arguments, got {}", args.len())));
    }
    let mut out = [0i64; N];
    for i in 0..N {
        out[i] = args[i]
            .parse()
            .map_err(|_| Error::protocol(format!("argument {i} is not an integer: {:?}", args[i])))?;
    }
    Ok(out)
}
