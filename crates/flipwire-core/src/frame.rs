//! Wire format for panel commands.
//!
//! A frame is `80 83 <address> <payload...> 8F`, written raw and back to back
//! with the next frame. There is no length prefix, no checksum and no
//! escaping: a payload byte that equals a marker byte goes out unchanged and
//! the device gets no way to tell the two apart. Changing that would break
//! compatibility with existing controllers, so it is left alone.
//!
//! Nothing is read back. A successful send only means the transport took
//! every byte.

use std::fmt;
use std::io::Write;

use crate::error::Result;
use crate::link::Link;
use crate::pattern::Pattern;

pub const START_MARKER: [u8; 2] = [0x80, 0x83];
pub const END_MARKER: [u8; 1] = [0x8F];

/// Bytes a frame adds around its payload.
pub const FRAME_OVERHEAD: usize = START_MARKER.len() + 1 + END_MARKER.len();

/// One command: a region address and the pattern to write there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub address: u8,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn new(address: u8, payload: &'a [u8]) -> Self {
        Self { address, payload }
    }

    /// Bytes this frame occupies on the wire.
    pub fn wire_len(&self) -> usize {
        self.payload.len() + FRAME_OVERHEAD
    }

    /// Appends the wire bytes to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.reserve(self.wire_len());
        buf.extend_from_slice(&START_MARKER);
        buf.push(self.address);
        buf.extend_from_slice(self.payload);
        buf.extend_from_slice(&END_MARKER);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_len());
        self.encode_into(&mut buf);
        buf
    }
}

impl fmt::Display for Frame<'_> {
    /// Upper-case hex, space separated, as it appears on the wire.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.encode().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Sends one frame over `link`.
///
/// The frame is assembled first and handed to the link as a single buffer,
/// so its four segments are contiguous on the wire. If the transport fails
/// partway the error is returned and the frame is not resumed.
pub fn send<P: Write>(link: &mut Link<P>, address: u8, payload: &[u8]) -> Result<()> {
    let mut buf = Vec::with_capacity(payload.len() + FRAME_OVERHEAD);
    send_frame(link, &Frame::new(address, payload), &mut buf)
}

fn send_frame<P: Write>(
    link: &mut Link<P>,
    frame: &Frame<'_>,
    buf: &mut Vec<u8>,
) -> Result<()> {
    buf.clear();
    frame.encode_into(buf);
    log::debug!(
        "frame to {:#04x} ({} payload bytes) on {}",
        frame.address,
        frame.payload.len(),
        link.name()
    );
    log::trace!("TX: {frame}");
    link.write_bytes(buf)?;
    Ok(())
}

/// Frame encoder bound to the link it writes through.
///
/// Owns the link for its lifetime and closes it when dropped. The frame
/// buffer is reused between sends.
pub struct Panel<P: Write = Box<dyn serialport::SerialPort>> {
    link: Link<P>,
    buf: Vec<u8>,
}

impl<P: Write> Panel<P> {
    pub fn new(link: Link<P>) -> Self {
        Self {
            link,
            buf: Vec::new(),
        }
    }

    pub fn send(&mut self, address: u8, payload: &[u8]) -> Result<()> {
        send_frame(&mut self.link, &Frame::new(address, payload), &mut self.buf)
    }

    /// Fills the region at `address` with `pattern`, `len` bytes long.
    pub fn fill(&mut self, address: u8, pattern: Pattern, len: usize) -> Result<()> {
        let payload = pattern.payload(len);
        self.send(address, &payload)
    }

    pub fn link(&self) -> &Link<P> {
        &self.link
    }

    pub fn close(&mut self) {
        self.link.close();
    }

    pub fn into_link(self) -> Link<P> {
        self.link
    }
}
