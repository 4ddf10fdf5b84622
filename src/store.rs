//! The client-side copy of the user's transactions.

use crate::api::{Api, Credential};
use crate::error::{Error, ErrorType, Result};
use crate::model::Transaction;
use crate::slot::{Slot, Ticket};
use tracing::{debug, warn};

/// Holds the most recently loaded transactions, in the order the service sent them.
///
/// Every successful load replaces the whole list. A failed load leaves it untouched, as does a
/// load whose response arrives after that of a newer load.
#[derive(Debug)]
pub struct TransactionStore {
    slot: Slot<Vec<Transaction>>,
}

impl Default for TransactionStore {
    fn default() -> Self {
        Self {
            slot: Slot::new("transactions"),
        }
    }
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the transactions and, if this is the newest load to complete, replaces the stored
    /// list with them. Returns the stored list afterwards.
    ///
    /// Fails with `AuthMissing` before sending anything when there is no credential.
    pub async fn load(
        &self,
        api: &dyn Api,
        credential: Option<&Credential>,
    ) -> Result<Vec<Transaction>> {
        let credential = credential.ok_or_else(not_signed_in)?;
        let ticket = self.slot.begin();
        debug!("Loading transactions ({ticket:?})");
        match api.list_transactions(credential).await {
            Ok(transactions) => {
                let count = transactions.len();
                if self.slot.finish(ticket, transactions) {
                    debug!("Loaded {count} transactions");
                }
                Ok(self.slot.get())
            }
            Err(e) => {
                warn!("Unable to load transactions: {e:#}");
                Err(e)
            }
        }
    }

    /// A copy of the stored transactions.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.slot.get()
    }

    /// Runs `f` against the stored transactions without copying them.
    pub fn with<R>(&self, f: impl FnOnce(&[Transaction]) -> R) -> R {
        self.slot.with(|transactions| f(transactions))
    }

    /// The most recently started load.
    pub(crate) fn issued(&self) -> Ticket {
        self.slot.issued()
    }

    /// The load whose transactions are held now.
    pub(crate) fn applied(&self) -> Ticket {
        self.slot.applied()
    }

    /// Whether a load has succeeded yet.
    pub fn is_loaded(&self) -> bool {
        self.slot.is_loaded()
    }
}

pub(crate) fn not_signed_in() -> Error {
    Error::new(
        ErrorType::AuthMissing,
        "Not signed in: no credential is stored",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestClient;

    fn credential() -> Credential {
        Credential::new("token").unwrap()
    }

    #[tokio::test]
    async fn test_load_replaces_contents() {
        let api = TestClient::default();
        let store = TransactionStore::new();
        assert!(!store.is_loaded());
        let loaded = store.load(&api, Some(&credential())).await.unwrap();
        assert_eq!(loaded.len(), 7);
        assert!(store.is_loaded());

        let mut state = api.state();
        state.transactions.truncate(2);
        api.set_state(state);
        store.load(&api, Some(&credential())).await.unwrap();
        assert_eq!(store.transactions().len(), 2);
    }

    #[tokio::test]
    async fn test_no_credential_is_auth_missing_without_a_request() {
        let api = TestClient::default();
        let store = TransactionStore::new();
        let err = store.load(&api, None).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::AuthMissing);
        assert_eq!(api.requests(), 0);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_prior_contents() {
        let api = TestClient::default();
        let store = TransactionStore::new();
        store.load(&api, Some(&credential())).await.unwrap();

        api.fail_next(Some("database is down"));
        let err = store.load(&api, Some(&credential())).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::FetchFailed);
        assert_eq!(err.message(), "database is down");
        assert_eq!(store.with(|t| t.len()), 7);
    }

    #[tokio::test]
    async fn test_generic_message_without_server_detail() {
        let api = TestClient::default();
        let store = TransactionStore::new();
        api.fail_next(None);
        let err = store.load(&api, Some(&credential())).await.unwrap_err();
        assert_eq!(err.message(), "Failed to fetch transactions");
        assert!(store.transactions().is_empty());
    }
}
