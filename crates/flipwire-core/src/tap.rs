use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct TapEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub data: Vec<u8>,
}

/// In-memory transport that records every write it accepts.
///
/// Stands in for the serial port in dry runs. Only the newest `max_entries`
/// writes are kept.
#[derive(Debug)]
pub struct WireTap {
    entries: Vec<TapEntry>,
    max_entries: usize,
}

impl WireTap {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    pub fn entries(&self) -> &[TapEntry] {
        &self.entries
    }

    /// Everything recorded, in write order, as one stream.
    pub fn bytes(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|e| e.data.iter().copied()).collect()
    }
}

impl Default for WireTap {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl Write for WireTap {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        self.entries.push(TapEntry {
            timestamp,
            data: buf.to_vec(),
        });

        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
