//! One user's view of the service: their transactions, the taxonomy and the editor.

use crate::aggregate::Dashboard;
use crate::api::{self, Api, Credential, Mode};
use crate::editor::{Editor, EditorState};
use crate::error::Result;
use crate::model::{Taxonomy, Transaction, TransactionDraft, TransactionId, TransactionType};
use crate::slot::Ticket;
use crate::store::TransactionStore;
use crate::taxonomy::TaxonomyCache;
use crate::Config;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Owns the transaction store, the taxonomy cache and the editor for a signed-in user, and keeps
/// them consistent: every successful write is followed by a reload of the transactions.
pub struct Session {
    api: Arc<dyn Api>,
    credential: Option<Credential>,
    store: TransactionStore,
    taxonomy: TaxonomyCache,
    editor: Editor,
    /// Loads up to this one may have started before the last write and cannot be trusted.
    stale_through: Mutex<Ticket>,
}

impl Session {
    pub fn new(api: Arc<dyn Api>, credential: Option<Credential>) -> Self {
        Self {
            api,
            credential,
            store: TransactionStore::new(),
            taxonomy: TaxonomyCache::new(),
            editor: Editor::new(),
            stale_through: Mutex::new(Ticket::default()),
        }
    }

    /// Creates the `Api` for `mode` and picks up the stored credential, if any.
    pub async fn open(config: &Config, mode: Mode) -> Result<Self> {
        let api = api::client(config, mode)?;
        let credential = config.credential().await?;
        debug!(
            "Opened a {mode:?} session, signed in: {}",
            credential.is_some()
        );
        Ok(Self::new(api, credential))
    }

    pub fn is_signed_in(&self) -> bool {
        self.credential.is_some()
    }

    pub fn store(&self) -> &TransactionStore {
        &self.store
    }

    pub fn taxonomy(&self) -> &TaxonomyCache {
        &self.taxonomy
    }

    pub fn editor_state(&self) -> EditorState {
        self.editor.state()
    }

    /// How the most recent create, update or delete ended.
    pub fn last_outcome(&self) -> Option<EditorState> {
        self.editor.last_outcome()
    }

    /// False before the first load and after a write, until a load started after the write has
    /// been applied. Views derived from the store should not be trusted while this is false.
    pub fn is_consistent(&self) -> bool {
        self.store.applied() > *self.stale_through()
    }

    fn stale_through(&self) -> MutexGuard<'_, Ticket> {
        self.stale_through
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn load_transactions(&self) -> Result<Vec<Transaction>> {
        self.store
            .load(self.api.as_ref(), self.credential.as_ref())
            .await
    }

    pub async fn load_taxonomy(&self) -> Result<Taxonomy> {
        self.taxonomy
            .load(self.api.as_ref(), self.credential.as_ref())
            .await
    }

    /// Loads transactions and the taxonomy concurrently. Each result is independent of the other.
    pub async fn refresh(&self) -> (Result<Vec<Transaction>>, Result<Taxonomy>) {
        tokio::join!(self.load_transactions(), self.load_taxonomy())
    }

    /// Marks the stored transactions, and every load already under way, as out of date and
    /// reloads them.
    pub async fn invalidate_and_reload(&self) -> Result<Vec<Transaction>> {
        *self.stale_through() = self.store.issued();
        self.load_transactions().await
    }

    /// Looks up a transaction in the store by id.
    pub fn transaction(&self, id: &TransactionId) -> Option<Transaction> {
        self.store
            .with(|transactions| transactions.iter().find(|t| t.id() == id).cloned())
    }

    /// The "will be created" hints for an expense draft, against the cached taxonomy.
    pub fn hints(&self, draft: &TransactionDraft) -> Vec<String> {
        match draft.kind() {
            Some(TransactionType::Expense) => self
                .taxonomy
                .hints(draft.category().trim(), draft.subcategory().trim()),
            _ => Vec::new(),
        }
    }

    /// Creates a transaction and reloads. Returns the hints for any category or subcategory that
    /// the service will have created along with it.
    pub async fn create(&self, draft: &TransactionDraft) -> Result<Vec<String>> {
        let hints = self.hints(draft);
        self.editor
            .create(self.api.as_ref(), self.credential.as_ref(), draft)
            .await?;
        self.reload_after_write().await;
        Ok(hints)
    }

    /// Replaces transaction `id` with `draft` and reloads. Returns hints as `create` does.
    pub async fn update(
        &self,
        id: &TransactionId,
        draft: &TransactionDraft,
    ) -> Result<Vec<String>> {
        let hints = self.hints(draft);
        self.editor
            .update(self.api.as_ref(), self.credential.as_ref(), id, draft)
            .await?;
        self.reload_after_write().await;
        Ok(hints)
    }

    /// Deletes transaction `id` and reloads.
    pub async fn remove(&self, id: &TransactionId) -> Result<()> {
        self.editor
            .remove(self.api.as_ref(), self.credential.as_ref(), id)
            .await?;
        self.reload_after_write().await;
        Ok(())
    }

    /// The write itself has succeeded, so a failed reload is not reported as a failure of the
    /// write. The session stays inconsistent until the next successful load.
    async fn reload_after_write(&self) {
        if let Err(e) = self.invalidate_and_reload().await {
            warn!("Saved, but unable to reload transactions: {e:#}");
        }
    }

    /// Totals and recent items from the stored transactions.
    pub fn dashboard(&self) -> Result<Dashboard> {
        self.store.with(Dashboard::build)
    }
}
