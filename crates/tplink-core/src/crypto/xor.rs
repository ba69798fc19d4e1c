//! XOR autokey cipher for the TP-Link Smart Home Protocol.
//!
//! Every byte is XORed with a running key that starts at 171 and is replaced
//! by the ciphertext byte after each step. The key restarts for every
//! message, so encoding the same payload twice yields the same bytes.
//!
//! The cipher only obfuscates payloads; it provides no confidentiality.

/// Initial key for the XOR autokey cipher.
pub const INITIAL_KEY: u8 = 171;

/// Encrypts a plaintext payload.
///
/// The output has the same length as the input and carries no length
/// prefix; framing is the transport's concern.
///
/// # Example
///
/// ```
/// use tplink_core::crypto::xor::{decrypt, encrypt};
///
/// let command = br#"{"system":{"get_sysinfo":null}}"#;
/// let encrypted = encrypt(command);
///
/// assert_eq!(encrypted.len(), command.len());
/// assert_eq!(decrypt(&encrypted), command);
/// ```
pub fn encrypt(plaintext: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    let mut result = Vec::with_capacity(plaintext.len());

    for &byte in plaintext {
        let encrypted = key ^ byte;
        key = encrypted;
        result.push(encrypted);
    }

    result
}

/// Decrypts a ciphertext payload (without its length prefix).
pub fn decrypt(ciphertext: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    let mut result = Vec::with_capacity(ciphertext.len());

    for &byte in ciphertext {
        result.push(key ^ byte);
        key = byte;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let original = br#"{"system":{"get_sysinfo":null}}"#;
        let encrypted = encrypt(original);
        assert_eq!(decrypt(&encrypted), original);
    }

    #[test]
    fn test_roundtrip_every_byte_value() {
        let original: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();
        assert_eq!(decrypt(&encrypt(&original)), original);
    }

    #[test]
    fn test_empty_payload() {
        assert!(encrypt(&[]).is_empty());
        assert!(decrypt(&[]).is_empty());
    }

    #[test]
    fn test_key_resets_per_message() {
        let payload = b"hello world";
        assert_eq!(encrypt(payload), encrypt(payload));
    }

    #[test]
    fn test_known_ciphertext() {
        // '{' (0x7b) ^ 171 = 0xd0, then '"' (0x22) ^ 0xd0 = 0xf2
        assert_eq!(encrypt(b"{\""), vec![0xd0, 0xf2]);
        assert_eq!(decrypt(&[0xd0, 0xf2]), b"{\"");
    }
}
