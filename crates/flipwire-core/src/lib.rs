//! Framing and transmission for serial-attached dot panels.

pub mod error;
pub mod frame;
pub mod link;
pub mod pattern;
pub mod shared;
pub mod tap;

pub use error::{LinkError, Result};
pub use frame::{send, Frame, Panel, END_MARKER, FRAME_OVERHEAD, START_MARKER};
pub use link::{
    list_ports, CloseHandle, Link, LinkConfig, PortInfo, DEFAULT_BAUD_RATE, DEFAULT_PORT,
};
pub use pattern::{Pattern, DEFAULT_PAYLOAD_LEN};
pub use shared::SharedLink;
pub use tap::{TapEntry, WireTap};
