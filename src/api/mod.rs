//! The boundary with the remote tracker service.
//!
//! `Api` is implemented by `HttpClient`, which talks to the real service, and by `TestClient`,
//! which emulates it in memory. Both classify failures the same way through `Op::failure`.

mod http_client;
mod test_client;

use crate::error::{Error, ErrorType, Result};
use crate::model::{Taxonomy, Transaction, TransactionBody, TransactionId};
use crate::Config;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

pub use test_client::{TestClient, TestState};

pub(crate) use http_client::HttpClient;

/// When this environment variable is set and non-empty, the in-memory service is used.
pub const TEST_MODE_ENV: &str = "TALLY_IN_TEST_MODE";

pub(crate) const TRANSACTIONS_PATH: &str = "/api/transactions";
pub(crate) const CATEGORIES_PATH: &str = "/api/categories";

/// The operations the service offers.
#[async_trait::async_trait]
pub trait Api: Send + Sync {
    /// `GET /api/transactions`. Items are returned in the order the service sent them.
    async fn list_transactions(&self, credential: &Credential) -> Result<Vec<Transaction>>;

    /// `POST /api/transactions`.
    async fn create_transaction(&self, credential: &Credential, body: &TransactionBody)
        -> Result<()>;

    /// `PUT /api/transactions/{id}`.
    async fn update_transaction(
        &self,
        credential: &Credential,
        id: &TransactionId,
        body: &TransactionBody,
    ) -> Result<()>;

    /// `DELETE /api/transactions/{id}`.
    async fn delete_transaction(&self, credential: &Credential, id: &TransactionId) -> Result<()>;

    /// `GET /api/categories`.
    async fn list_categories(&self, credential: &Credential) -> Result<Taxonomy>;
}

/// Selects the `Api` implementation.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Http,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// Creates the `Api` implementation for `mode`.
pub fn client(config: &Config, mode: Mode) -> Result<Arc<dyn Api>> {
    debug!("Creating {mode:?} API client");
    match mode {
        Mode::Http => Ok(Arc::new(HttpClient::new(config)?)),
        Mode::Test => Ok(Arc::new(TestClient::default())),
    }
}

/// A bearer token. It can only be constructed from a non-blank string and is never logged.
#[derive(Clone, Eq, PartialEq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(Error::new(
                ErrorType::AuthMissing,
                "Not signed in: no credential is stored",
            ));
        }
        Ok(Self(token))
    }

    pub(crate) fn token(&self) -> &str {
        &self.0
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Identifies a service operation so that failures get the right kind and generic message.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Op {
    ListTransactions,
    CreateTransaction,
    UpdateTransaction,
    DeleteTransaction,
    ListCategories,
}

impl Op {
    fn error_type(self) -> ErrorType {
        match self {
            Op::ListTransactions | Op::ListCategories => ErrorType::FetchFailed,
            Op::CreateTransaction | Op::UpdateTransaction | Op::DeleteTransaction => {
                ErrorType::SubmitFailed
            }
        }
    }

    fn generic_message(self) -> &'static str {
        match self {
            Op::ListTransactions => "Failed to fetch transactions",
            Op::ListCategories => "Failed to fetch categories",
            Op::CreateTransaction => "Failed to save transaction",
            Op::UpdateTransaction => "Update failed!",
            Op::DeleteTransaction => "Delete failed!",
        }
    }

    /// The service answered with a failure. Its own message is used verbatim when there is one.
    pub(crate) fn failure(self, server_message: Option<String>) -> Error {
        match server_message.filter(|m| !m.trim().is_empty()) {
            Some(message) => Error::new(self.error_type(), message),
            None => Error::new(self.error_type(), self.generic_message()),
        }
    }

    /// The request never got an answer, or the answer could not be read.
    pub(crate) fn transport(self, e: anyhow::Error) -> Error {
        Error::with_source(self.error_type(), e.context(self.generic_message()))
    }
}

/// The service rejected the credential. This is the same for every operation: the user has to
/// sign in again.
pub(crate) fn unauthorized(server_message: Option<String>) -> Error {
    let detail = server_message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "credential rejected".to_string());
    Error::new(
        ErrorType::AuthMissing,
        format!("Not signed in: {detail}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_rejects_blank() {
        let err = Credential::new("   ").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::AuthMissing);
        assert!(Credential::new("abc").is_ok());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let c = Credential::new("super-secret").unwrap();
        assert!(!format!("{c:?}").contains("super-secret"));
    }

    #[test]
    fn test_failure_uses_server_message() {
        let e = Op::UpdateTransaction.failure(Some("Category too long".to_string()));
        assert_eq!(e.message(), "Category too long");
        assert_eq!(e.error_type(), ErrorType::SubmitFailed);
    }

    #[test]
    fn test_failure_falls_back_to_generic_message() {
        assert_eq!(Op::UpdateTransaction.failure(None).message(), "Update failed!");
        assert_eq!(Op::DeleteTransaction.failure(None).message(), "Delete failed!");
        assert_eq!(
            Op::CreateTransaction.failure(Some("  ".to_string())).message(),
            "Failed to save transaction"
        );
        let e = Op::ListTransactions.failure(None);
        assert_eq!(e.error_type(), ErrorType::FetchFailed);
        assert_eq!(e.message(), "Failed to fetch transactions");
    }

    #[test]
    fn test_unauthorized() {
        let e = unauthorized(Some("Token has expired".to_string()));
        assert!(e.is_auth_missing());
        assert_eq!(e.message(), "Not signed in: Token has expired");
        assert_eq!(unauthorized(None).message(), "Not signed in: credential rejected");
    }

    #[test]
    fn test_transport_error_keeps_cause() {
        let e = Op::ListCategories.transport(anyhow::anyhow!("timed out"));
        assert_eq!(e.message(), "Failed to fetch categories");
        assert_eq!(format!("{e:#}"), "Failed to fetch categories: timed out");
    }
}
