//! A synthetic backend driver used for local testing and as a worked
//! example of the plugin boundary. It does not speak any real remote-desktop
//! protocol; it emits a single static frame on `init` and logs the input
//! events it receives. A real driver (e.g. for RFB) follows the same shape
//! but drives an actual backend connection from `handle_messages`.

use std::net::TcpStream;

use log::info;

use crate::driver::{BackendDriver, DriverContext, MouseButtons};
use crate::error::Result;
use crate::protocol::{write_png, write_size};
use crate::stream::Stream;

const WIDTH: u32 = 4;
const HEIGHT: u32 = 4;

/// One solid-color RGB frame, `WIDTH` x `HEIGHT`, sent once at `init`.
#[derive(Default)]
pub struct DemoDriver {
    frame: Vec<u8>,
}

pub fn factory() -> Box<dyn BackendDriver> {
    Box::new(DemoDriver::default())
}

impl BackendDriver for DemoDriver {
    fn init(&mut self, ctx: &DriverContext, stream: &mut Stream<TcpStream>, args: &[String]) -> Result<()> {
        info!("demo driver starting for {} (args: {args:?})", ctx.id);
        self.frame = vec![0x20u8; (WIDTH * HEIGHT * 3) as usize];

        stream.write_string("name:")?;
        stream.write_string("demo desktop")?;
        stream.write_string(";")?;
        write_size(stream, WIDTH as i64, HEIGHT as i64)?;
        write_png(stream, 0, 0, WIDTH, HEIGHT, &self.frame)?;
        Ok(())
    }

    fn mouse(
        &mut self,
        ctx: &DriverContext,
        _stream: &mut Stream<TcpStream>,
        x: i32,
        y: i32,
        buttons: MouseButtons,
    ) -> Result<()> {
        info!("demo driver {}: mouse {x},{y} buttons={buttons:?}", ctx.id);
        Ok(())
    }

    fn key(&mut self, ctx: &DriverContext, _stream: &mut Stream<TcpStream>, keysym: i64, pressed: bool) -> Result<()> {
        info!("demo driver {}: key {keysym:#x} pressed={pressed}", ctx.id);
        Ok(())
    }

    fn clipboard(&mut self, ctx: &DriverContext, _stream: &mut Stream<TcpStream>, text: &str) -> Result<()> {
        info!("demo driver {}: clipboard {text:?}", ctx.id);
        Ok(())
    }

    fn free(&mut self, ctx: &DriverContext) {
        info!("demo driver {} shutting down", ctx.id);
    }
}
