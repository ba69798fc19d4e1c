//! TCP transport for the TP-Link Smart Home Protocol.
//!
//! - TCP connection on port 9999, one connection per request
//! - 4-byte big-endian length prefix followed by the enciphered payload
//! - XOR autokey cipher with initial key 171
//! - No authentication

use std::{io::ErrorKind, time::Duration};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use tracing::debug;

use crate::{
    crypto::xor::{decrypt, encrypt},
    error::Error,
    transport::{DeviceConfig, Transport},
};

/// Largest response payload accepted from a device.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Size of the big-endian length prefix.
const HEADER_LEN: usize = 4;

/// Enciphers `plaintext` and prepends the 4-byte big-endian length prefix.
///
/// # Example
///
/// ```
/// use tplink_core::transport::tcp::encode_frame;
///
/// let command = br#"{"system":{"get_sysinfo":null}}"#;
/// let frame = encode_frame(command);
///
/// assert_eq!(&frame[..4], &(command.len() as u32).to_be_bytes());
/// assert_eq!(frame.len(), 4 + command.len());
/// ```
pub fn encode_frame(plaintext: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LEN + plaintext.len());
    frame.extend_from_slice(&(plaintext.len() as u32).to_be_bytes());
    frame.extend_from_slice(&encrypt(plaintext));
    frame
}

/// Writes one frame to `writer`.
pub async fn write_frame<W>(writer: &mut W, plaintext: &[u8], limit: Duration) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(plaintext);
    debug!(bytes = frame.len(), "sending frame");

    timeout(limit, writer.write_all(&frame))
        .await
        .map_err(|_| Error::Timeout("Write timed out".into()))?
        .map_err(|e| Error::IoError(e.to_string()))?;

    Ok(())
}

/// Reads exactly one frame from `reader` and returns the deciphered payload.
///
/// A stream that ends before the declared number of bytes arrived is a
/// [`Error::Frame`]; nothing is truncated or padded.
pub async fn read_frame<R>(reader: &mut R, limit: Duration) -> Result<Vec<u8>, Error>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; HEADER_LEN];
    timeout(limit, reader.read_exact(&mut len_buf))
        .await
        .map_err(|_| Error::Timeout("Read timed out".into()))?
        .map_err(|e| short_read(e, "length header"))?;

    let payload_len = u32::from_be_bytes(len_buf) as usize;
    debug!(payload_bytes = payload_len, "response payload length");

    if payload_len > MAX_FRAME_LEN {
        return Err(Error::Frame(format!(
            "Response too large: {} bytes",
            payload_len
        )));
    }

    let mut payload = vec![0u8; payload_len];
    timeout(limit, reader.read_exact(&mut payload))
        .await
        .map_err(|_| Error::Timeout("Read timed out".into()))?
        .map_err(|e| short_read(e, &format!("{} byte payload", payload_len)))?;

    Ok(decrypt(&payload))
}

fn short_read(err: std::io::Error, what: &str) -> Error {
    if err.kind() == ErrorKind::UnexpectedEof {
        Error::Frame(format!("connection closed before {} was read", what))
    } else {
        Error::IoError(err.to_string())
    }
}

/// Transport that opens a fresh TCP connection for every request.
///
/// # Example
///
/// ```no_run
/// use tplink_core::transport::{DeviceConfig, TcpTransport, Transport};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let transport = TcpTransport::new(&DeviceConfig::new("192.168.1.100"));
///     let response = transport.send(br#"{"system":{"get_sysinfo":null}}"#).await?;
///     println!("{}", String::from_utf8_lossy(&response));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TcpTransport {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpTransport {
    /// Creates a transport for the endpoint in `config`. No I/O happens here.
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            timeout: config.timeout,
        }
    }

    async fn round_trip(&self, request: &[u8]) -> Result<Vec<u8>, Error> {
        let addr = format!("{}:{}", self.host, self.port);
        debug!(addr = %addr, "connecting");

        // The stream is dropped, and the socket closed, on every return path.
        let mut stream = timeout(self.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| Error::Timeout("Connection timed out".into()))?
            .map_err(|e| Error::ConnectionFailed(format!("{}: {}", addr, e)))?;

        debug!(addr = %addr, "connected");

        write_frame(&mut stream, request, self.timeout).await?;
        let response = read_frame(&mut stream, self.timeout).await?;

        debug!(addr = %addr, bytes = response.len(), "received response");
        Ok(response)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, request: &[u8]) -> Result<Vec<u8>, Error> {
        self.round_trip(request).await
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    const LIMIT: Duration = Duration::from_secs(2);

    async fn listener() -> (TcpListener, DeviceConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = DeviceConfig::new("127.0.0.1")
            .with_port(port)
            .with_timeout(Duration::from_millis(500));
        (listener, config)
    }

    #[test]
    fn test_encode_frame_has_length_header() {
        let frame = encode_frame(b"test");
        let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
        assert_eq!(len, 4);
        assert_eq!(decrypt(&frame[4..]), b"test");
    }

    #[tokio::test]
    async fn test_read_frame_from_buffer() {
        let frame = encode_frame(br#"{"ok":1}"#);
        let mut reader = &frame[..];
        let payload = read_frame(&mut reader, LIMIT).await.unwrap();
        assert_eq!(payload, br#"{"ok":1}"#);
    }

    #[tokio::test]
    async fn test_read_frame_short_payload() {
        let mut frame = encode_frame(b"0123456789");
        frame.truncate(HEADER_LEN + 3);
        let mut reader = &frame[..];
        let err = read_frame(&mut reader, LIMIT).await.unwrap_err();
        assert!(matches!(err, Error::Frame(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_read_frame_short_header() {
        let bytes = [0u8, 0];
        let mut reader = &bytes[..];
        let err = read_frame(&mut reader, LIMIT).await.unwrap_err();
        assert!(matches!(err, Error::Frame(_)));
    }

    #[tokio::test]
    async fn test_read_frame_rejects_oversized_length() {
        let header = ((MAX_FRAME_LEN + 1) as u32).to_be_bytes();
        let mut reader = &header[..];
        let err = read_frame(&mut reader, LIMIT).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_round_trip_against_listener() {
        let (listener, config) = listener().await;

        let device = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_frame(&mut socket, LIMIT).await.unwrap();
            assert_eq!(request, br#"{"system":{"get_sysinfo":null}}"#);
            write_frame(&mut socket, br#"{"system":{"get_sysinfo":{"err_code":0}}}"#, LIMIT)
                .await
                .unwrap();
        });

        let transport = TcpTransport::new(&config);
        let response = transport
            .send(br#"{"system":{"get_sysinfo":null}}"#)
            .await
            .unwrap();
        assert_eq!(response, br#"{"system":{"get_sysinfo":{"err_code":0}}}"#);
        device.await.unwrap();
    }

    #[tokio::test]
    async fn test_truncated_response_is_transport_failure() {
        let (listener, config) = listener().await;

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = read_frame(&mut socket, LIMIT).await;
            let mut frame = encode_frame(br#"{"system":{}}"#);
            frame.truncate(frame.len() - 2);
            socket.write_all(&frame).await.unwrap();
            // socket dropped here, closing the connection mid-frame
        });

        let err = TcpTransport::new(&config).send(b"{}").await.unwrap_err();
        assert!(matches!(err, Error::Frame(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_silent_device_times_out() {
        let (listener, config) = listener().await;

        let device = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(socket);
        });

        let err = TcpTransport::new(&config).send(b"{}").await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)), "{err:?}");
        device.abort();
    }
}
