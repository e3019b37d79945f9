//! Envelope encoding
//!
//! The binary layout is a plain concatenation:
//!
//! | offset | length | field      |
//! |--------|--------|------------|
//! | 0      | 16     | salt       |
//! | 16     | 12     | nonce      |
//! | 28     | N      | ciphertext |
//! | 28+N   | 16     | GCM tag    |
//!
//! There is no version byte; the layout above is format version 1. The
//! text form is standard (padded) base64 of the whole byte string.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::cipher::{NONCE_LEN, TAG_LEN};
use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use crate::kdf::SALT_LEN;

/// Format version described by the layout in this module.
pub const FORMAT_VERSION: u8 = 1;

/// Smallest possible envelope: an empty plaintext still carries salt, nonce and tag.
pub const MIN_ENVELOPE_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// A decoded envelope. Salt and nonce are public parameters, `body` is the
/// ciphertext with the tag appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    body: Vec<u8>,
}

impl Envelope {
    pub fn new(salt: [u8; SALT_LEN], nonce: [u8; NONCE_LEN], body: Vec<u8>) -> Self {
        Self { salt, nonce, body }
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Ciphertext followed by the authentication tag.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        encode(&self.salt, &self.nonce, &self.body)
    }
}

/// Concatenate salt, nonce and body into envelope bytes.
pub fn encode(salt: &[u8; SALT_LEN], nonce: &[u8; NONCE_LEN], body: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(SALT_LEN + NONCE_LEN + body.len());
    output.extend_from_slice(salt);
    output.extend_from_slice(nonce);
    output.extend_from_slice(body);
    output
}

/// Split envelope bytes into salt, nonce and body.
///
/// Only the minimum length is checked here. Whether the body is a valid
/// ciphertext for some key is decided by the cipher.
pub fn decode(bytes: &[u8]) -> Result<Envelope> {
    if bytes.len() < MIN_ENVELOPE_LEN {
        return Err(LockboxError::malformed_envelope(format!(
            "envelope is {} bytes, shorter than the minimum of {}; likely truncated",
            bytes.len(),
            MIN_ENVELOPE_LEN
        )));
    }

    let (salt, rest) = bytes.split_at(SALT_LEN);
    let (nonce, body) = rest.split_at(NONCE_LEN);

    let salt: [u8; SALT_LEN] = salt.try_into().map_err(|_| {
        LockboxError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "failed to read salt",
        )
    })?;
    let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|_| {
        LockboxError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "failed to read nonce",
        )
    })?;

    Ok(Envelope::new(salt, nonce, body.to_vec()))
}

/// Encode envelope bytes as standard base64.
pub fn to_text(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode the base64 text form back into envelope bytes.
///
/// Surrounding whitespace (such as a trailing newline) is ignored.
pub fn from_text(text: &str) -> Result<Vec<u8>> {
    STANDARD.decode(text.trim_ascii()).map_err(|e| {
        LockboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedEnvelope,
            format!("base64 decoding failed: {}", e),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope::new([0x01; SALT_LEN], [0x02; NONCE_LEN], vec![0x03; TAG_LEN + 5])
    }

    #[test]
    fn test_layout() {
        let bytes = sample().to_bytes();

        assert_eq!(bytes.len(), SALT_LEN + NONCE_LEN + TAG_LEN + 5);
        assert!(bytes[..16].iter().all(|&b| b == 0x01));
        assert!(bytes[16..28].iter().all(|&b| b == 0x02));
        assert!(bytes[28..].iter().all(|&b| b == 0x03));
    }

    #[test]
    fn test_decode_splits_fields() {
        let envelope = sample();
        let decoded = decode(&envelope.to_bytes()).unwrap();

        assert_eq!(decoded, envelope);
        assert_eq!(decoded.salt(), &[0x01; SALT_LEN]);
        assert_eq!(decoded.nonce(), &[0x02; NONCE_LEN]);
        assert_eq!(decoded.body().len(), TAG_LEN + 5);
    }

    #[test]
    fn test_decode_minimum_length() {
        let decoded = decode(&[0u8; MIN_ENVELOPE_LEN]).unwrap();
        assert_eq!(decoded.body().len(), TAG_LEN);
    }

    #[test]
    fn test_decode_too_short() {
        for len in [0, 1, SALT_LEN, SALT_LEN + NONCE_LEN, MIN_ENVELOPE_LEN - 1] {
            let err = decode(&vec![0u8; len]).expect_err("expected malformed envelope");
            assert_eq!(err.kind, Some(ErrorKind::MalformedEnvelope));
        }
    }

    #[test]
    fn test_text_is_standard_base64() {
        let bytes: Vec<u8> = (0..=255).collect();
        let text = to_text(&bytes);

        assert!(text.ends_with("+/w=="));
        assert!(!text.contains('\n'));
        assert_eq!(from_text(&text).unwrap(), bytes);
    }

    #[test]
    fn test_text_known_value() {
        assert_eq!(to_text(b"hello"), "aGVsbG8=");
        assert_eq!(from_text("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_text_surrounding_whitespace_ignored() {
        assert_eq!(from_text("  aGVsbG8=\n").unwrap(), b"hello");
        assert_eq!(from_text("aGVsbG8=\r\n").unwrap(), b"hello");
    }

    #[test]
    fn test_bad_base64() {
        for text in ["bad$$", "aGVs bG8=", "aGVsbG8", "-_-_"] {
            let err = from_text(text).expect_err("expected base64 decode error");
            assert_eq!(err.kind, Some(ErrorKind::MalformedEnvelope));
        }
    }
}
