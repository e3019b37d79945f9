//! Password-based key derivation using PBKDF2-HMAC-SHA256
//!
//! The iteration count is a constant of the envelope format rather than
//! something stored per envelope, so it must never change within a
//! format version.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{LockboxError, Result};

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of derived key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// A 256-bit key derived from a password. Wiped from memory on drop.
pub struct DerivedKey(Zeroizing<[u8; KEY_LEN]>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive a 32-byte key from a password and a 16-byte salt.
///
/// Deterministic: the same (password, salt) always yields the same key.
/// Password content is never validated here; rejecting empty passwords is
/// the job of the callers in [`crate::secretcrypt`].
pub fn derive(password: &[u8], salt: &[u8]) -> Result<DerivedKey> {
    if salt.len() != SALT_LEN {
        return Err(LockboxError::invalid_input(format!(
            "salt must be {} bytes, got {}",
            SALT_LEN,
            salt.len()
        )));
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, &mut key[..]);
    tracing::debug!(iterations = PBKDF2_ITERATIONS, "derived key");

    Ok(DerivedKey(key))
}

/// Generate a fresh random salt from the OS CSPRNG.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}
