//! Core library for communicating with TP-Link smart bulbs and plugs.
//!
//! This crate implements the TP-Link Smart Home Protocol spoken on TCP port
//! 9999 and layers a typed device model on top of it.
//!
//! # Overview
//!
//! - [`crypto::xor`]: the autokey XOR cipher that obfuscates payloads
//! - [`transport`]: length-prefixed frames over one TCP connection per request
//! - [`Client`]: builds `{"<system>":{"<command>":...}}` envelopes, sends them
//!   and unwraps the command result, surfacing `err_code` as
//!   [`Error::DeviceError`]
//! - [`device`]: [`Plug`], [`MeterPlug`] and [`Bulb`] with cached state and
//!   capability-gated operations
//! - [`stats`]: day and month energy statistics as keyed maps
//!
//! # Example
//!
//! ```no_run
//! use tplink_core::{DeviceConfig, device::Bulb};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tplink_core::Error> {
//!     let mut bulb = Bulb::connect(&DeviceConfig::new("192.168.1.100")).await?;
//!     if bulb.is_dimmable() {
//!         bulb.set_brightness(40).await?;
//!     }
//!     println!("on: {}", bulb.is_powered_on());
//!     Ok(())
//! }
//! ```
//!
//! # Protocol Details
//!
//! 1. Commands are JSON objects (e.g., `{"system":{"get_sysinfo":null}}`)
//! 2. The JSON is enciphered using an XOR autokey cipher with initial key 171
//! 3. A 4-byte big-endian length prefix is prepended
//! 4. The message is sent over TCP to port 9999
//! 5. The response follows the same format and is deciphered the same way

pub mod client;
pub mod commands;
pub mod crypto;
pub mod device;
pub mod error;
pub mod response;
pub mod stats;
pub mod transport;

pub use client::Client;
pub use commands::Command;
pub use device::{Bulb, Capabilities, Capability, Device, Hsv, MeterPlug, Plug, SmartDevice};
pub use error::Error;
pub use transport::{DEFAULT_PORT, DEFAULT_TIMEOUT, DeviceConfig, TcpTransport, Transport};

use serde_json::Value;

/// The version of the tplink-core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sends a single command to the device in `config` and returns its result.
///
/// # Example
///
/// ```no_run
/// use tplink_core::{Command, DeviceConfig, commands, send_command};
///
/// #[tokio::main]
/// async fn main() -> Result<(), tplink_core::Error> {
///     let info = send_command(
///         &DeviceConfig::new("192.168.1.100"),
///         &Command::query(commands::SYSTEM, commands::GET_SYSINFO),
///     )
///     .await?;
///
///     println!("Device info: {}", info);
///     Ok(())
/// }
/// ```
pub async fn send_command(config: &DeviceConfig, command: &Command) -> Result<Value, Error> {
    Client::new(config).execute(command).await
}
