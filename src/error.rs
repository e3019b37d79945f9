use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to the caller.
    ///
    /// Use of Internal is never a guarantee that the error was not caused
    /// by bad input, only that the code cannot tell.
    Internal,

    /// The caller supplied invalid input, the wrong password, or data
    /// that is not a valid envelope.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed call arguments: wrong-length salt, nonce or key, or an
    /// empty password.
    InvalidInput,
    /// The envelope is shorter than the minimum layout or its text form
    /// is not valid base64.
    MalformedEnvelope,
    /// Tag verification failed. Covers both a wrong password and
    /// tampered or corrupted data; the two are deliberately not told apart.
    AuthenticationFailed,
    /// Password could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Unexpected state reached within lockbox logic.
    InternalInvariant,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct LockboxError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag. Preserved across `with_context`,
    /// so the outermost error always carries the kind of the root cause.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl LockboxError {
    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorCategory::User, ErrorKind::InvalidInput, msg)
    }

    pub(crate) fn malformed_envelope(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorCategory::User, ErrorKind::MalformedEnvelope, msg)
    }

    /// The single message used for every tag mismatch.
    pub(crate) fn authentication_failed() -> Self {
        Self::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "authentication failed: wrong password or corrupted data",
        )
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LockboxError>;
