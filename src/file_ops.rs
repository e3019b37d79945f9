//! File encryption/decryption operations
//!
//! Reading the source file, obtaining the password and writing the result
//! live here, outside the in-memory core in [`crate::secretcrypt`].

use crate::envelope;
use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use crate::passphrase::PassphraseReader;
use crate::secretcrypt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// On-disk representation of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeForm {
    /// Raw envelope bytes.
    #[default]
    Binary,
    /// Standard base64 of the envelope bytes.
    Text,
}

/// Encrypt a file with a password
///
/// Reads plaintext from `input_path`, encrypts it using a password from
/// `passphrase_reader`, and writes the envelope to `output_path` in `form`.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    form: EnvelopeForm,
) -> Result<()> {
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let envelope_bytes = with_passphrase(passphrase_reader, |passphrase| {
        secretcrypt::encrypt(&plaintext, passphrase)
            .map_err(|e| e.with_context("encryption failed"))
    })?;

    let contents = match form {
        EnvelopeForm::Binary => envelope_bytes,
        EnvelopeForm::Text => envelope::to_text(&envelope_bytes).into_bytes(),
    };
    write_file_atomic(output_path, &contents)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    tracing::debug!(
        input = %input_path.display(),
        output = %output_path.display(),
        ?form,
        bytes = contents.len(),
        "encrypted file"
    );

    Ok(())
}

/// Decrypt a file with a password
///
/// Reads an envelope in `form` from `input_path`, decrypts it using a password from
/// `passphrase_reader`, and writes the plaintext to `output_path`. Nothing is
/// written unless authentication succeeds.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    form: EnvelopeForm,
) -> Result<()> {
    let raw = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let envelope_bytes = match form {
        EnvelopeForm::Binary => raw,
        EnvelopeForm::Text => {
            let text = String::from_utf8(raw).map_err(|e| {
                LockboxError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::MalformedEnvelope,
                    "input file is not valid UTF-8",
                    e,
                )
            })?;
            envelope::from_text(&text).map_err(|e| e.with_context("failed to decode text"))?
        }
    };
    let plaintext = with_passphrase(passphrase_reader, |passphrase| {
        secretcrypt::decrypt(&envelope_bytes, passphrase)
            .map_err(|e| e.with_context("failed to decrypt"))
    })?;
    write_file_atomic(output_path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    tracing::debug!(
        input = %input_path.display(),
        output = %output_path.display(),
        ?form,
        bytes = plaintext.len(),
        "decrypted file"
    );

    Ok(())
}

/// Read the password and hand it to `op`
///
/// The password is zeroized when `op` returns, before the caller goes on to
/// write any output. `op` cannot hand out a borrow of it.
fn with_passphrase<T>(
    passphrase_reader: &mut dyn PassphraseReader,
    op: impl FnOnce(&[u8]) -> Result<T>,
) -> Result<T> {
    let passphrase = passphrase_reader.read_passphrase()?;
    op(&passphrase)
}

/// Write `contents` to `path` via a tempfile in the same directory
///
/// Flushes and fsyncs before renaming, so `path` either keeps its previous
/// contents or holds the complete new contents, never a partial write.
fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        LockboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to create tempfile in {}", dir.display()),
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| {
        LockboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    temp_file.flush().map_err(|e| {
        LockboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        LockboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| {
                LockboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to set tempfile permissions",
                    e,
                )
            })?;
    }

    temp_file.persist(path).map_err(|e| {
        LockboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn read_error(path: &Path, err: io::Error) -> LockboxError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    LockboxError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
