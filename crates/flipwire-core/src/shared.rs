use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

use crate::error::Result;
use crate::frame;
use crate::link::{CloseHandle, Link};

/// Link handle that can be cloned across threads.
///
/// The lock is held for exactly one frame, so frames from different senders
/// never interleave on the wire. Their relative order is whatever order the
/// senders acquire the lock in.
pub struct SharedLink<P: Write = Box<dyn serialport::SerialPort>> {
    inner: Arc<Mutex<Link<P>>>,
    closer: CloseHandle,
}

impl<P: Write> Clone for SharedLink<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            closer: self.closer.clone(),
        }
    }
}

impl<P: Write> SharedLink<P> {
    pub fn new(link: Link<P>) -> Self {
        let closer = link.close_handle();
        Self {
            inner: Arc::new(Mutex::new(link)),
            closer,
        }
    }

    pub fn send(&self, address: u8, payload: &[u8]) -> Result<()> {
        let mut link = self.inner.lock();
        frame::send(&mut *link, address, payload)
    }

    /// Closes the underlying link for every holder without waiting for a
    /// send in progress. That send fails with a write error and releases the
    /// port itself; later sends fail too.
    pub fn close(&self) {
        self.closer.close();
        if let Some(mut link) = self.inner.try_lock() {
            link.close();
        }
    }

    pub fn is_open(&self) -> bool {
        !self.closer.is_closing() && self.inner.lock().is_open()
    }
}
