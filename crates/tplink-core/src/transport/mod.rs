//! Transport layer for communicating with TP-Link devices.
//!
//! - [`TcpTransport`]: length-prefixed, XOR-enciphered frames over TCP port 9999
//!
//! The [`Transport`] trait is the seam the command executor talks through.
//! Each call to [`Transport::send`] is one complete request/response
//! exchange; implementations do not keep connections between calls.

pub mod tcp;

pub use tcp::TcpTransport;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;

/// Default TCP port for TP-Link smart devices.
pub const DEFAULT_PORT: u16 = 9999;

/// Default timeout for connect, write and each frame read.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Endpoint and timeout for a device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// The device hostname or IP address.
    pub host: String,
    /// TCP port, [`DEFAULT_PORT`] unless overridden.
    pub port: u16,
    /// Connection and I/O timeout.
    pub timeout: Duration,
}

impl DeviceConfig {
    /// Creates a new device configuration.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A single request/response channel to one device.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a plaintext request and returns the plaintext response.
    async fn send(&self, request: &[u8]) -> Result<Vec<u8>, Error>;

    /// Returns the device host.
    fn host(&self) -> &str;

    /// Returns the device port.
    fn port(&self) -> u16;
}
