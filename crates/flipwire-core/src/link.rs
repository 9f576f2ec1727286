use serialport::{SerialPort, SerialPortInfo};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LinkError, Result};

/// Baud rate the panel controller listens at.
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// Device the panel is wired to on the reference board.
pub const DEFAULT_PORT: &str = "/dev/ttyAMA0";

/// Stand-in for "no timeout". The backend only accepts a finite wait.
const UNBOUNDED_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (port_type, vid, pid, product) = match &info.port_type {
            serialport::SerialPortType::UsbPort(usb) => {
                ("USB".to_string(), Some(usb.vid), Some(usb.pid), usb.product.clone())
            }
            serialport::SerialPortType::PciPort => ("PCI".to_string(), None, None, None),
            serialport::SerialPortType::BluetoothPort => {
                ("Bluetooth".to_string(), None, None, None)
            }
            serialport::SerialPortType::Unknown => ("Unknown".to_string(), None, None, None),
        };
        Self {
            port_name: info.port_name,
            port_type,
            vid,
            pid,
            product,
        }
    }
}

/// Serial ports visible to this host, for diagnostics when opening fails.
pub fn list_ports() -> Vec<PortInfo> {
    serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub parity: serialport::Parity,
    pub stop_bits: serialport::StopBits,
    pub flow_control: serialport::FlowControl,
    /// The panel protocol has no timeout of its own; `None` keeps it that way.
    pub write_timeout: Option<Duration>,
}

impl LinkConfig {
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            ..Default::default()
        }
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    fn transport_timeout(&self) -> Duration {
        self.write_timeout.unwrap_or(UNBOUNDED_WAIT)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port_name: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: serialport::DataBits::Eight,
            parity: serialport::Parity::None,
            stop_bits: serialport::StopBits::One,
            flow_control: serialport::FlowControl::None,
            write_timeout: None,
        }
    }
}

/// Exclusive, write-only connection to the panel.
///
/// The port is released by [`Link::close`] or, failing that, when the link
/// is dropped, so every exit path gives the device back. Writes after close
/// fail with [`LinkError::Write`].
///
/// A link is not meant to be written from several threads at once; wrap it
/// in a [`SharedLink`](crate::SharedLink) for that.
pub struct Link<P: Write = Box<dyn SerialPort>> {
    name: String,
    port: Option<P>,
    closing: Arc<AtomicBool>,
}

/// Requests a close from outside the thread that is writing.
///
/// The writer notices between transport calls, releases the port and fails
/// its send with [`LinkError::Write`]. A single transport call that is
/// already stalled is not preempted; it is bounded only by the write timeout.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    closing: Arc<AtomicBool>,
}

impl CloseHandle {
    pub fn close(&self) {
        self.closing.store(true, Ordering::Release);
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }
}

impl Link {
    pub fn open(cfg: &LinkConfig) -> Result<Self> {
        if cfg.baud_rate == 0 {
            return Err(LinkError::configuration(
                "baud rate 0",
                serialport::Error::new(
                    serialport::ErrorKind::InvalidInput,
                    "baud rate must be non-zero",
                ),
            ));
        }

        let mut port = serialport::new(&cfg.port_name, cfg.baud_rate)
            .timeout(cfg.transport_timeout())
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::InvalidInput => {
                    LinkError::configuration(format!("baud rate {}", cfg.baud_rate), e)
                }
                _ => LinkError::LinkUnavailable {
                    port: cfg.port_name.clone(),
                    source: e,
                },
            })?;

        configure_port(port.as_mut(), cfg)?;
        log::info!("opened {} at {} baud", cfg.port_name, cfg.baud_rate);

        Ok(Self::from_port(cfg.port_name.clone(), port))
    }
}

fn configure_port(port: &mut dyn SerialPort, cfg: &LinkConfig) -> Result<()> {
    port.set_baud_rate(cfg.baud_rate)
        .map_err(|e| LinkError::configuration(format!("baud rate {}", cfg.baud_rate), e))?;
    port.set_data_bits(cfg.data_bits)
        .map_err(|e| LinkError::configuration("data bits", e))?;
    port.set_parity(cfg.parity)
        .map_err(|e| LinkError::configuration("parity", e))?;
    port.set_stop_bits(cfg.stop_bits)
        .map_err(|e| LinkError::configuration("stop bits", e))?;
    port.set_flow_control(cfg.flow_control)
        .map_err(|e| LinkError::configuration("flow control", e))?;
    Ok(())
}

impl<P: Write> Link<P> {
    /// Wraps an already-open transport.
    pub fn from_port(name: impl Into<String>, port: P) -> Self {
        Self {
            name: name.into(),
            port: Some(port),
            closing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            closing: Arc::clone(&self.closing),
        }
    }

    /// Writes all of `buf`, blocking until the transport has accepted every
    /// byte. Short writes are continued; nothing is reported as success
    /// unless the whole buffer went out.
    ///
    /// A close requested through a [`CloseHandle`] while this runs fails the
    /// call, even if the last transport write completed.
    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        let mut written = 0;
        loop {
            if self.closing.load(Ordering::Acquire) {
                self.close();
            }
            let Some(port) = self.port.as_mut() else {
                return Err(io::Error::new(
                    io::ErrorKind::NotConnected,
                    format!("link is closed after {written} of {} bytes", buf.len()),
                )
                .into());
            };
            if written == buf.len() {
                return Ok(written);
            }
            match port.write(&buf[written..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("transport accepted {written} of {} bytes", buf.len()),
                    )
                    .into());
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Releases the port. Closing twice is a no-op.
    pub fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush() {
                log::warn!("flush on close of {} failed: {e}", self.name);
            }
            log::info!("closed {}", self.name);
        }
    }

    pub fn port(&self) -> Option<&P> {
        self.port.as_ref()
    }
}

impl<P: Write> Drop for Link<P> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Chunked {
        out: Vec<u8>,
        chunk: usize,
        interrupt_first: bool,
    }

    impl Write for Chunked {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.interrupt_first {
                self.interrupt_first = false;
                return Err(io::ErrorKind::Interrupted.into());
            }
            let n = buf.len().min(self.chunk);
            self.out.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn short_writes_are_continued() {
        let port = Chunked {
            out: Vec::new(),
            chunk: 3,
            interrupt_first: true,
        };
        let mut link = Link::from_port("mock", port);
        assert_eq!(link.write_bytes(&[1, 2, 3, 4, 5, 6, 7]).unwrap(), 7);
        assert_eq!(link.port().unwrap().out, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn zero_write_is_an_error() {
        let port = Chunked {
            out: Vec::new(),
            chunk: 0,
            interrupt_first: false,
        };
        let mut link = Link::from_port("mock", port);
        match link.write_bytes(&[0x80]) {
            Err(LinkError::Write(e)) => assert_eq!(e.kind(), io::ErrorKind::WriteZero),
            other => panic!("expected write error, got {other:?}"),
        }
    }

    #[test]
    fn close_twice_is_harmless() {
        let mut link = Link::from_port("mock", Vec::new());
        link.close();
        link.close();
        assert!(!link.is_open());
    }

    #[test]
    fn write_after_close_fails() {
        let mut link = Link::from_port("mock", Vec::new());
        link.close();
        match link.write_bytes(&[0x8F]) {
            Err(LinkError::Write(e)) => assert_eq!(e.kind(), io::ErrorKind::NotConnected),
            other => panic!("expected write error, got {other:?}"),
        }
    }

    #[test]
    fn close_request_fails_the_write_in_progress() {
        let port = Chunked {
            out: Vec::new(),
            chunk: 2,
            interrupt_first: false,
        };
        let mut link = Link::from_port("mock", port);
        let handle = link.close_handle();
        handle.close();
        match link.write_bytes(&[1, 2, 3]) {
            Err(LinkError::Write(e)) => assert_eq!(e.kind(), io::ErrorKind::NotConnected),
            other => panic!("expected write error, got {other:?}"),
        }
        assert!(!link.is_open());
        assert!(handle.is_closing());
    }

    #[test]
    fn zero_baud_is_rejected_before_opening() {
        let cfg = LinkConfig::new("/dev/does-not-matter", 0);
        assert!(matches!(Link::open(&cfg), Err(LinkError::Configuration { .. })));
    }

    #[test]
    fn missing_device_is_unavailable() {
        let cfg = LinkConfig::new("/dev/flipwire-no-such-device", DEFAULT_BAUD_RATE);
        assert!(matches!(Link::open(&cfg), Err(LinkError::LinkUnavailable { .. })));
    }

    #[test]
    fn default_config_matches_panel() {
        let cfg = LinkConfig::default();
        assert_eq!(cfg.baud_rate, 57_600);
        assert_eq!(cfg.port_name, "/dev/ttyAMA0");
        assert!(cfg.write_timeout.is_none());
    }
}
