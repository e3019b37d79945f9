//! Password-based encryption using PBKDF2-HMAC-SHA256 + AES-256-GCM
//!
//! Each call draws a fresh salt and nonce, derives a key, and seals the
//! plaintext into an [`envelope`](crate::envelope). Nothing is cached
//! between calls, so concurrent calls need no coordination.

use crate::cipher::{self, NONCE_LEN};
use crate::envelope;
use crate::error::{LockboxError, Result};
use crate::kdf::{self, SALT_LEN};

fn check_password(password: &[u8]) -> Result<()> {
    if password.is_empty() {
        return Err(LockboxError::invalid_input("password must not be empty"));
    }
    Ok(())
}

/// Encrypt plaintext with a password using random salt and nonce
///
/// Returns `salt(16) + nonce(12) + ciphertext(N) + tag(16)`.
pub fn encrypt(plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    encrypt_deterministic(
        plaintext,
        password,
        &kdf::generate_salt(),
        &cipher::generate_nonce(),
    )
}

/// Encrypt plaintext with a password using provided salt and nonce
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `encrypt()` which generates random salt/nonce.
pub fn encrypt_deterministic(
    plaintext: &[u8],
    password: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    check_password(password)?;

    let key = kdf::derive(password, salt)?;
    let body = cipher::seal(key.as_bytes(), nonce, plaintext)?;
    tracing::debug!(
        plaintext_len = plaintext.len(),
        envelope_len = SALT_LEN + NONCE_LEN + body.len(),
        "sealed envelope"
    );

    Ok(envelope::encode(salt, nonce, &body))
}

/// Decrypt envelope bytes with a password
///
/// A short envelope is reported as malformed whatever the password, and
/// is rejected before any key derivation happens.
pub fn decrypt(envelope_bytes: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    let envelope = envelope::decode(envelope_bytes)?;
    check_password(password)?;

    let key = kdf::derive(password, envelope.salt())?;
    let plaintext = cipher::open(key.as_bytes(), envelope.nonce(), envelope.body())
        .inspect_err(|e| tracing::debug!(kind = ?e.kind, "failed to open envelope"))?;
    tracing::debug!(
        envelope_len = envelope_bytes.len(),
        plaintext_len = plaintext.len(),
        "opened envelope"
    );

    Ok(plaintext)
}

/// Like [`encrypt`], returning the base64 text form of the envelope.
pub fn encrypt_to_text(plaintext: &[u8], password: &[u8]) -> Result<String> {
    Ok(envelope::to_text(&encrypt(plaintext, password)?))
}

/// Like [`decrypt`], taking the base64 text form of the envelope.
pub fn decrypt_text(text: &str, password: &[u8]) -> Result<Vec<u8>> {
    let bytes = envelope::from_text(text)?;
    decrypt(&bytes, password)
}
