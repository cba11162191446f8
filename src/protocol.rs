//! Outbound instruction encoding: `name`, `size`, `copy`, `png`,
//! `cursor`, `clipboard`, `error`, and the handoff handshake's `id` reply.

use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::instruction::escape;
use crate::stream::Stream;

/// Adapts a [`Stream`]'s `write_base64` into a plain [`std::io::Write`] sink
/// so the `png` crate's streaming encoder can write straight into the
/// base64 sub-stream, mirroring a `png_set_write_fn`-style redirection.
struct Base64Sink<'a, T> {
    stream: &'a mut Stream<T>,
}

impl<'a, T: Read + Write + AsRawFd> io::Write for Base64Sink<'a, T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write_base64(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn map_png_err(e: png::EncodingError) -> Error {
    match e {
        png::EncodingError::IoError(io_err) => Error::Transport(io_err),
        other => Error::protocol(format!("png encoding error: {other}")),
    }
}

/// `name:desktop_name;`
pub fn write_name<T: Read + Write + AsRawFd>(stream: &mut Stream<T>, name: &str) -> Result<()> {
    stream.write_string("name:")?;
    stream.write_string(&escape(name))?;
    stream.write_string(";")?;
    Ok(())
}

/// `size:width,height;`
pub fn write_size<T: Read + Write + AsRawFd>(stream: &mut Stream<T>, width: i64, height: i64) -> Result<()> {
    stream.write_string("size:")?;
    stream.write_int(width)?;
    stream.write_string(",")?;
    stream.write_int(height)?;
    stream.write_string(";")?;
    Ok(())
}

/// `copy:srcx,srcy,w,h,dstx,dsty;`
#[allow(clippy::too_many_arguments)]
pub fn write_copy<T: Read + Write + AsRawFd>(
    stream: &mut Stream<T>,
    srcx: i64,
    srcy: i64,
    w: i64,
    h: i64,
    dstx: i64,
    dsty: i64,
) -> Result<()> {
    stream.write_string("copy:")?;
    for (i, v) in [srcx, srcy, w, h, dstx, dsty].into_iter().enumerate() {
        if i > 0 {
            stream.write_string(",")?;
        }
        stream.write_int(v)?;
    }
    stream.write_string(";")?;
    Ok(())
}

/// `clipboard:text;`
pub fn write_clipboard<T: Read + Write + AsRawFd>(stream: &mut Stream<T>, text: &str) -> Result<()> {
    stream.write_string("clipboard:")?;
    stream.write_string(&escape(text))?;
    stream.write_string(";")?;
    Ok(())
}

/// `error:message;`
pub fn write_error<T: Read + Write + AsRawFd>(stream: &mut Stream<T>, message: &str) -> Result<()> {
    stream.write_string("error:")?;
    stream.write_string(&escape(message))?;
    stream.write_string(";")?;
    Ok(())
}

/// `id:<base64-uuid>;` — the handoff handshake's reply to a successful
/// `connect`. Streamed through the same base64 path as PNG payloads, not a
/// separate one-off routine.
pub fn write_id<T: Read + Write + AsRawFd>(stream: &mut Stream<T>, id: Uuid) -> Result<()> {
    stream.write_string("id:")?;
    stream.write_base64(id.as_bytes())?;
    stream.flush_base64()?;
    stream.write_string(";")?;
    Ok(())
}

fn write_image_instruction<T: Read + Write + AsRawFd>(
    stream: &mut Stream<T>,
    opcode: &str,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
    color: png::ColorType,
    pixels: &[u8],
) -> Result<()> {
    stream.write_string(opcode)?;
    stream.write_string(":")?;
    stream.write_int(x)?;
    stream.write_string(",")?;
    stream.write_int(y)?;
    stream.write_string(",")?;

    {
        let sink = Base64Sink { stream };
        let mut encoder = png::Encoder::new(sink, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(map_png_err)?;
        writer.write_image_data(pixels).map_err(map_png_err)?;
    }

    stream.flush_base64()?;
    stream.write_string(";")?;
    Ok(())
}

/// `png:x,y,<base64 PNG>;` — `rgb` must contain exactly `width * height * 3`
/// bytes (8-bit RGB, row-major).
pub fn write_png<T: Read + Write + AsRawFd>(
    stream: &mut Stream<T>,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
    rgb: &[u8],
) -> Result<()> {
    write_image_instruction(stream, "png", x, y, width, height, png::ColorType::Rgb, rgb)
}

/// `cursor:x,y,<base64 RGBA PNG>;` — `rgba` must contain exactly
/// `width * height * 4` bytes.
pub fn write_cursor<T: Read + Write + AsRawFd>(
    stream: &mut Stream<T>,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> Result<()> {
    write_image_instruction(stream, "cursor", x, y, width, height, png::ColorType::Rgba, rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;
    use std::os::unix::net::UnixStream;

    fn drain(stream: Stream<UnixStream>, mut peer: UnixStream) -> Vec<u8> {
        drop(stream);
        let mut out = Vec::new();
        peer.set_nonblocking(true).unwrap();
        let _ = peer.read_to_end(&mut out);
        out
    }

    #[test]
    fn name_and_size_wire_format() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut stream = Stream::open(a);
        write_name(&mut stream, "hello").unwrap();
        write_size(&mut stream, 640, 480).unwrap();
        stream.flush().unwrap();
        let out = drain(stream, b);
        assert_eq!(out, b"name:hello;size:640,480;");
    }

    #[test]
    fn clipboard_escapes_argument() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut stream = Stream::open(a);
        write_clipboard(&mut stream, "a,b;c\\d").unwrap();
        stream.flush().unwrap();
        let out = drain(stream, b);
        assert_eq!(out, b"clipboard:a\\cb\\sc\\\\d;");
    }

    #[test]
    fn png_round_trip_decodes() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut stream = Stream::open(a);
        // 2x1 RGB image: one red pixel, one green pixel.
        let pixels = [255u8, 0, 0, 0, 255, 0];
        write_png(&mut stream, 0, 0, 2, 1, &pixels).unwrap();
        stream.flush().unwrap();
        let out = drain(stream, b);

        let prefix = b"png:0,0,";
        assert_eq!(&out[..prefix.len()], prefix);
        assert_eq!(out[out.len() - 1], b';');
        let b64 = &out[prefix.len()..out.len() - 1];
        assert_eq!(b64.len() % 4, 0);

        let png_bytes = decode_base64(b64);
        let decoder = png::Decoder::new(std::io::Cursor::new(png_bytes));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!(&buf[..info.buffer_size()], &pixels[..]);
    }

    #[test]
    fn id_instruction_carries_uuid() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut stream = Stream::open(a);
        let id = Uuid::from_bytes([0x11; 16]);
        write_id(&mut stream, id).unwrap();
        stream.flush().unwrap();
        let out = drain(stream, b);
        assert!(out.starts_with(b"id:"));
        assert!(out.ends_with(b";"));
        let b64 = &out[3..out.len() - 1];
        assert_eq!(decode_base64(b64), id.as_bytes());
    }

    /// Minimal base64 decoder for test assertions only.
    fn decode_base64(input: &[u8]) -> Vec<u8> {
        fn value(c: u8) -> u8 {
            match c {
                b'A'..=b'Z' => c - b'A',
                b'a'..=b'z' => c - b'a' + 26,
                b'0'..=b'9' => c - b'0' + 52,
                b'+' => 62,
                b'/' => 63,
                _ => 0,
            }
        }
        let mut out = Vec::new();
        for chunk in input.chunks(4) {
            let pad = chunk.iter().filter(|&&c| c == b'=').count();
            let v0 = value(chunk[0]);
            let v1 = value(chunk[1]);
            let v2 = if chunk.len() > 2 { value(chunk[2]) } else { 0 };
            let v3 = if chunk.len() > 3 { value(chunk[3]) } else { 0 };
            out.push((v0 << 2) | (v1 >> 4));
            if pad < 2 {
                out.push((v1 << 4) | (v2 >> 2));
            }
            if pad < 1 {
                out.push((v2 << 6) | v3);
            }
        }
        out
    }
}
