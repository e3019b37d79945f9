//! Authenticated encryption with AES-256-GCM
//!
//! `seal` and `open` are separate operations with no mode flag. Associated
//! data is always empty for this format. The ciphertext returned by `seal`
//! has the 16-byte tag appended, and `open` expects the same layout.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{LockboxError, Result};
use crate::kdf::KEY_LEN;

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the GCM authentication tag in bytes
pub const TAG_LEN: usize = 16;

fn new_cipher(key: &[u8], nonce: &[u8]) -> Result<Aes256Gcm> {
    if key.len() != KEY_LEN {
        return Err(LockboxError::invalid_input(format!(
            "key must be {} bytes, got {}",
            KEY_LEN,
            key.len()
        )));
    }
    if nonce.len() != NONCE_LEN {
        return Err(LockboxError::invalid_input(format!(
            "nonce must be {} bytes, got {}",
            NONCE_LEN,
            nonce.len()
        )));
    }
    Aes256Gcm::new_from_slice(key)
        .map_err(|_| LockboxError::invalid_input(format!("key must be {} bytes", KEY_LEN)))
}

/// Encrypt `plaintext`, returning ciphertext followed by the tag.
///
/// The output is always `plaintext.len() + TAG_LEN` bytes long.
pub fn seal(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = new_cipher(key, nonce)?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| LockboxError::invalid_input("plaintext too large for AES-GCM"))
}

/// Verify and decrypt `ciphertext_and_tag`.
///
/// No plaintext is returned unless the tag verifies. A wrong key and
/// modified data produce the same `AuthenticationFailed` error.
pub fn open(key: &[u8], nonce: &[u8], ciphertext_and_tag: &[u8]) -> Result<Vec<u8>> {
    let cipher = new_cipher(key, nonce)?;
    if ciphertext_and_tag.len() < TAG_LEN {
        return Err(LockboxError::authentication_failed());
    }
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext_and_tag)
        .map_err(|_| LockboxError::authentication_failed())
}

/// Generate a fresh random nonce from the OS CSPRNG.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const KEY: [u8; KEY_LEN] = [0x11; KEY_LEN];
    const NONCE: [u8; NONCE_LEN] = [0x22; NONCE_LEN];

    #[test]
    fn test_seal_open_roundtrip() {
        let sealed = seal(&KEY, &NONCE, b"hello").unwrap();
        assert_eq!(sealed.len(), 5 + TAG_LEN);

        let opened = open(&KEY, &NONCE, &sealed).unwrap();
        assert_eq!(opened, b"hello");
    }

    #[test]
    fn test_known_answer() {
        let sealed = seal(&KEY, &NONCE, b"hello").unwrap();

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            // ciphertext
            0x7f, 0x92, 0x6b, 0x25, 0xaf,
            // tag
            0x76, 0xef, 0x14, 0x18, 0x44, 0x5d, 0x55, 0xff,
            0xae, 0xfd, 0x03, 0xa2, 0x43, 0xad, 0x7d, 0x9a,
        ];
        assert_eq!(sealed, expected);
    }

    #[test]
    fn test_empty_plaintext_is_tag_only() {
        let sealed = seal(&KEY, &NONCE, b"").unwrap();

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x26, 0x0e, 0xed, 0xd2, 0xb5, 0x3a, 0xa1, 0x16,
            0x80, 0xe5, 0x07, 0x15, 0xf5, 0x20, 0x5d, 0xff,
        ];
        assert_eq!(sealed, expected);
        assert_eq!(open(&KEY, &NONCE, &sealed).unwrap(), b"");
    }

    #[test]
    fn test_wrong_key() {
        let sealed = seal(&KEY, &NONCE, b"secret data").unwrap();
        let err = open(&[0x12; KEY_LEN], &NONCE, &sealed).expect_err("expected auth failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_wrong_nonce() {
        let sealed = seal(&KEY, &NONCE, b"secret data").unwrap();
        let err = open(&KEY, &[0x23; NONCE_LEN], &sealed).expect_err("expected auth failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_tampered_ciphertext_and_tag() {
        let sealed = seal(&KEY, &NONCE, b"secret data").unwrap();
        for i in [0, 5, sealed.len() - TAG_LEN, sealed.len() - 1] {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0x01;
            let err = open(&KEY, &NONCE, &tampered).expect_err("expected auth failure");
            assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        }
    }

    #[test]
    fn test_shorter_than_tag() {
        for len in [0, 1, TAG_LEN - 1] {
            let err = open(&KEY, &NONCE, &vec![0u8; len]).expect_err("expected auth failure");
            assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        }
    }

    #[test]
    fn test_bad_key_length() {
        let err = seal(&KEY[..16], &NONCE, b"x").expect_err("expected invalid key");
        assert_eq!(err.kind, Some(ErrorKind::InvalidInput));

        let err = open(&[0u8; 33], &NONCE, &[0u8; 32]).expect_err("expected invalid key");
        assert_eq!(err.kind, Some(ErrorKind::InvalidInput));
    }

    #[test]
    fn test_bad_nonce_length() {
        let err = seal(&KEY, &[0u8; 24], b"x").expect_err("expected invalid nonce");
        assert_eq!(err.kind, Some(ErrorKind::InvalidInput));

        let err = open(&KEY, &NONCE[..8], &[0u8; 32]).expect_err("expected invalid nonce");
        assert_eq!(err.kind, Some(ErrorKind::InvalidInput));
    }

    #[test]
    fn test_generate_nonce_unique() {
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
