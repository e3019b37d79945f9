//! Lockbox - Password-based file encryption using PBKDF2 and AES-256-GCM
//!
//! The core works on in-memory buffers only:
//!
//! - [`kdf`] derives a 256-bit key from a password and a random salt.
//! - [`cipher`] seals and opens data with AES-256-GCM.
//! - [`envelope`] packs salt, nonce and sealed data into one buffer.
//! - [`secretcrypt`] composes the three into `encrypt` and `decrypt`.
//!
//! [`file_ops`] and [`passphrase`] connect the core to files and password
//! prompts for the `lockbox` binary.

#![forbid(unsafe_code)]

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod passphrase;
pub mod secretcrypt;

pub use error::{ErrorCategory, ErrorKind, LockboxError, Result};
pub use secretcrypt::{decrypt, decrypt_text, encrypt, encrypt_to_text};
