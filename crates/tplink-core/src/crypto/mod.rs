//! Payload obfuscation for TP-Link device communication.
//!
//! - [`xor`]: autokey XOR cipher used by the port 9999 protocol

pub mod xor;

pub use xor::{decrypt as xor_decrypt, encrypt as xor_encrypt};
