//! Error types.
//!
//! Internal code works with `anyhow` through the `Res` alias. Anything that crosses the public API
//! is converted into `Error`, which carries an `ErrorType` so that a caller can decide how to
//! present it: redirect to sign-in, show an inline message, block a form, etc.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of failure, which determines how it should be surfaced.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// There is no credential, or the service rejected it. The caller should send the user to
    /// sign in rather than display this inline.
    AuthMissing,
    /// A read from the service failed.
    FetchFailed,
    /// A draft is missing required fields. No request was made.
    Validation,
    /// A create, update or delete was rejected by the service or could not be sent.
    SubmitFailed,
    /// Another submission is already in flight on the same editor.
    Busy,
    /// Loaded data violates an invariant, e.g. a transaction without an amount.
    Data,
    /// The local configuration is missing or invalid.
    Config,
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type. `Display` shows the user-facing message; the alternate form (`{:#}`)
/// shows the full chain of causes.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new<M>(error_type: ErrorType, message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self {
            error_type,
            inner: anyhow::Error::msg(message),
        }
    }

    pub(crate) fn with_source(error_type: ErrorType, inner: anyhow::Error) -> Self {
        Self { error_type, inner }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// The user-facing message, without the chain of causes.
    pub fn message(&self) -> String {
        self.inner.to_string()
    }

    pub fn is_auth_missing(&self) -> bool {
        self.error_type == ErrorType::AuthMissing
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{:#}", self.inner)
        } else {
            Display::fmt(&self.inner, f)
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal `anyhow` result into a public `Result` with the given `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Res<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::with_source(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_message_is_outermost_context() {
        let res: Res<()> = Err(anyhow::anyhow!("connection refused")).context("Update failed!");
        let err = res.pub_result(ErrorType::SubmitFailed).unwrap_err();
        assert_eq!(err.message(), "Update failed!");
        assert_eq!(err.to_string(), "Update failed!");
        assert_eq!(format!("{err:#}"), "Update failed!: connection refused");
        assert_eq!(err.error_type(), ErrorType::SubmitFailed);
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::AuthMissing.to_string(), "auth_missing");
        assert_eq!(ErrorType::FetchFailed.to_string(), "fetch_failed");
    }

    #[test]
    fn test_is_auth_missing() {
        assert!(Error::new(ErrorType::AuthMissing, "no token").is_auth_missing());
        assert!(!Error::new(ErrorType::FetchFailed, "nope").is_auth_missing());
    }
}
