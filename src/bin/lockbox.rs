//! Lockbox CLI - Password-based file encryption
//!
//! Command-line interface for encrypting and decrypting files using
//! AES-256-GCM with PBKDF2-HMAC-SHA256 key derivation.

use clap::{Parser, Subcommand};
use std::error::Error as StdError;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use lockbox::error::{ErrorKind, LockboxError};
use lockbox::file_ops::{self, EnvelopeForm};
use lockbox::passphrase::{PassphraseReader, PipedPassphraseReader, TerminalPassphraseReader};

#[derive(Parser)]
#[command(name = "lockbox")]
#[command(version)]
#[command(about = "Password-based file encryption.", long_about = None)]
struct Cli {
    /// Read password from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Log progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the envelope to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Write the envelope as base64 text instead of raw bytes
        #[arg(long)]
        text: bool,
    },

    /// Decrypt a file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the envelope to decrypt
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the decrypted contents to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Read the envelope as base64 text instead of raw bytes
        #[arg(long)]
        text: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut reader = get_passphrase_reader(cli.passphrase_stdin);
    let result = match cli.command {
        Commands::Encrypt {
            input,
            output,
            text,
        } => file_ops::encrypt_file(&input, &output, &mut *reader, envelope_form(text)),
        Commands::Decrypt {
            input,
            output,
            text,
        } => file_ops::decrypt_file(&input, &output, &mut *reader, envelope_form(text)),
    };

    if let Err(e) = result {
        tracing::debug!(kind = ?e.kind, category = ?e.category, "command failed");
        eprintln!("Error: {}", user_message(&e));
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "lockbox=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn envelope_form(text: bool) -> EnvelopeForm {
    if text {
        EnvelopeForm::Text
    } else {
        EnvelopeForm::Binary
    }
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(PipedPassphraseReader::new(std::io::stdin()))
    } else {
        Box::new(TerminalPassphraseReader)
    }
}

/// Generic messages for cipher and envelope failures, so the output never
/// hints at which part of the input was wrong.
fn user_message(err: &LockboxError) -> String {
    match err.kind {
        Some(ErrorKind::AuthenticationFailed) => {
            "decryption failed: wrong password or corrupted data".to_string()
        }
        Some(ErrorKind::MalformedEnvelope) => "invalid or corrupted envelope".to_string(),
        _ => error_chain(err),
    }
}

fn error_chain(err: &LockboxError) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
