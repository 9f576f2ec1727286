//! Link errors

use thiserror::Error;

/// Errors raised while acquiring or writing to a link.
///
/// None of these are retried at this layer. A frame that fails partway is
/// not resumed; the caller decides whether to send it again.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("serial device {port} unavailable: {source}")]
    LinkUnavailable {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("cannot apply {setting}: {source}")]
    Configuration {
        setting: String,
        #[source]
        source: serialport::Error,
    },

    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}

impl LinkError {
    pub(crate) fn configuration(setting: impl Into<String>, source: serialport::Error) -> Self {
        Self::Configuration {
            setting: setting.into(),
            source,
        }
    }

    /// True for failures that happened while bytes were on their way out.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write(_))
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn write_error_keeps_io_cause() {
        let err = LinkError::from(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        assert!(err.is_write());
        assert_eq!(err.to_string(), "write failed: unplugged");
    }

    #[test]
    fn unavailable_names_the_port() {
        let err = LinkError::LinkUnavailable {
            port: "/dev/ttyAMA0".into(),
            source: serialport::Error::new(serialport::ErrorKind::NoDevice, "busy"),
        };
        assert!(err.to_string().contains("/dev/ttyAMA0"));
        assert!(err.source().is_some());
        assert!(!err.is_write());
    }
}
