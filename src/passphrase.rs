//! Password sources for the command-line front end
//!
//! The library core takes the password as a byte slice; these readers are
//! how the binary obtains it. Every source hands back `Zeroizing` bytes.

use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use std::io::{self, IsTerminal, Read};
use zeroize::Zeroizing;

const PROMPT: &str = "Password (lockbox): ";

pub trait PassphraseReader {
    /// Obtain the password as raw bytes, not necessarily UTF-8.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Reads the whole of `R` as the password (`--passphrase-stdin`)
///
/// One trailing `\n` or `\r\n` is dropped, so `echo secret | lockbox ...`
/// and a password file ending in a newline both yield `secret`.
pub struct PipedPassphraseReader<R> {
    source: R,
}

impl<R: Read> PipedPassphraseReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }
}

impl<R: Read> PassphraseReader for PipedPassphraseReader<R> {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.source.read_to_end(&mut data).map_err(|e| {
            LockboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to read password from stdin",
                e,
            )
        })?;
        let len = without_line_ending(&data).len();
        data.truncate(len);
        Ok(data)
    }
}

fn without_line_ending(data: &[u8]) -> &[u8] {
    match data.strip_suffix(b"\n") {
        Some(line) => line.strip_suffix(b"\r").unwrap_or(line),
        None => data,
    }
}

/// Prompts on the controlling terminal with echo disabled
///
/// rpassword only returns UTF-8; non-UTF-8 passwords need `--passphrase-stdin`.
pub struct TerminalPassphraseReader;

impl PassphraseReader for TerminalPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        require_terminal(io::stdin().is_terminal())?;
        let passphrase = rpassword::prompt_password(PROMPT).map_err(|e| {
            LockboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                "failed to read password from terminal",
                e,
            )
        })?;
        Ok(Zeroizing::new(passphrase.into_bytes()))
    }
}

fn require_terminal(stdin_is_terminal: bool) -> Result<()> {
    if stdin_is_terminal {
        Ok(())
    } else {
        Err(LockboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::PassphraseUnavailable,
            "stdin is not a terminal; pass --passphrase-stdin to pipe the password",
        ))
    }
}

/// Hands out the same password on every call.
#[cfg(test)]
pub(crate) struct FixedPassphraseReader(pub(crate) Vec<u8>);

#[cfg(test)]
impl PassphraseReader for FixedPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(self.0.clone()))
    }
}
