//! Error types for tplink-core.
//!
//! Failures fall into five groups: transport (socket and framing),
//! protocol shape (the response is not the JSON we asked for), device
//! reported (`err_code` != 0), unsupported capability, and invalid
//! arguments. None of them are retried by the library.

use thiserror::Error;

use crate::device::Capability;

/// Error type for tplink-core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connect, write or read exceeded the configured timeout.
    #[error("timeout: {0}")]
    Timeout(String),

    /// I/O error during communication.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The length-prefixed frame could not be read in full.
    #[error("frame error: {0}")]
    Frame(String),

    /// Failed to parse device response as JSON.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Response JSON did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Device answered with a non-zero `err_code`.
    #[error("device error {code}: {}", .message.as_deref().unwrap_or("no message"))]
    DeviceError {
        /// The `err_code` reported by the device.
        code: i64,
        /// The `err_msg` reported by the device, if any.
        message: Option<String>,
    },

    /// The device does not report the capability the operation needs.
    #[error("device does not support {0}")]
    Unsupported(Capability),

    /// A caller-supplied argument is outside the accepted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Returns true for socket and framing failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::ConnectionFailed(_) | Error::Timeout(_) | Error::IoError(_) | Error::Frame(_)
        )
    }

    /// Returns true when the device answered with something other than the
    /// expected response envelope.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::ParseError(_) | Error::Protocol(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::Timeout("read".into()).is_transport());
        assert!(Error::Frame("short".into()).is_transport());
        assert!(Error::ParseError("eof".into()).is_protocol());
        assert!(!Error::Protocol("missing".into()).is_transport());

        let device = Error::DeviceError {
            code: -1,
            message: None,
        };
        assert!(!device.is_transport());
        assert!(!device.is_protocol());
    }

    #[test]
    fn test_device_error_display() {
        let err = Error::DeviceError {
            code: -2,
            message: Some("member not support".into()),
        };
        assert_eq!(err.to_string(), "device error -2: member not support");
    }
}
