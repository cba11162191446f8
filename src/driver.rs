//! The plugin boundary: the trait every backend driver implements
//! and the bitfield/context types its methods take.
//!
//! `BackendDriver` is deliberately not generic over the transport: a driver
//! only ever runs against a live socket accepted by the host binary, so
//! fixing the stream's transport to `TcpStream` keeps the trait
//! object-safe and keeps driver authors from having to think about the
//! engine's test-only generic parameter at all.

use std::net::TcpStream;

use bitflags::bitflags;
use uuid::Uuid;

use crate::error::Result;
use crate::stream::Stream;

bitflags! {
    /// `button_mask` bitfield from a `mouse` instruction.
    #[derive(Default)]
    pub struct MouseButtons: u8 {
        const LEFT = 1;
        const MIDDLE = 2;
        const RIGHT = 4;
        const WHEEL_UP = 8;
        const WHEEL_DOWN = 16;
    }
}

/// Minimal read-only handle a driver gets in place of a raw client pointer.
/// The driver's own state lives on the driver struct itself, so this only
/// needs to carry identity for logging.
pub struct DriverContext {
    pub id: Uuid,
}

/// The backend driver contract. Every method but `init` defaults to a
/// no-op; a driver overrides only the handlers it needs.
pub trait BackendDriver: Send {
    fn init(&mut self, ctx: &DriverContext, stream: &mut Stream<TcpStream>, args: &[String]) -> Result<()>;

    fn handle_messages(&mut self, _ctx: &DriverContext, _stream: &mut Stream<TcpStream>) -> Result<()> {
        Ok(())
    }

    fn mouse(
        &mut self,
        _ctx: &DriverContext,
        _stream: &mut Stream<TcpStream>,
        _x: i32,
        _y: i32,
        _buttons: MouseButtons,
    ) -> Result<()> {
        Ok(())
    }

    fn key(&mut self, _ctx: &DriverContext, _stream: &mut Stream<TcpStream>, _keysym: i64, _pressed: bool) -> Result<()> {
        Ok(())
    }

    fn clipboard(&mut self, _ctx: &DriverContext, _stream: &mut Stream<TcpStream>, _text: &str) -> Result<()> {
        Ok(())
    }

    fn free(&mut self, _ctx: &DriverContext) {}
}

/// A compile-time driver name → constructor, replacing a `dlopen`'d
/// shared-object plugin with a static table.
pub type DriverFactory = fn() -> Box<dyn BackendDriver>;
