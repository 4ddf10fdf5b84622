//! Validates and submits creates, updates and deletes, one at a time.

use crate::api::{Api, Credential};
use crate::error::{Error, ErrorType, Result};
use crate::model::{Intent, TransactionBody, TransactionDraft, TransactionId};
use crate::store::not_signed_in;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Where the editor is in its current submission.
///
/// `Idle -> Validating -> Submitting -> Succeeded | Failed -> Idle`. A validation failure goes
/// straight from `Validating` to `Failed`. Once back at `Idle` the outcome is available from
/// `Editor::last_outcome`.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

serde_plain::derive_display_from_serialize!(EditorState);

/// A change the user has asked for.
#[derive(Debug, Clone, Copy)]
enum Submission<'a> {
    Create(&'a TransactionDraft),
    Update(&'a TransactionId, &'a TransactionDraft),
    Remove(&'a TransactionId),
}

/// A change that has passed validation and is ready to send.
#[derive(Debug)]
enum Request<'a> {
    Create(TransactionBody),
    Update(&'a TransactionId, TransactionBody),
    Remove(&'a TransactionId),
}

impl Display for Submission<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Submission::Create(draft) => match draft.kind() {
                Some(kind) => write!(f, "new {kind}"),
                None => f.write_str("new transaction"),
            },
            Submission::Update(id, _) => write!(f, "changes to transaction {id}"),
            Submission::Remove(id) => write!(f, "deletion of transaction {id}"),
        }
    }
}

impl<'a> Submission<'a> {
    fn prepare(self) -> Result<Request<'a>> {
        Ok(match self {
            Submission::Create(draft) => Request::Create(draft.validate(Intent::Create)?),
            Submission::Update(id, draft) => Request::Update(id, draft.validate(Intent::Update)?),
            Submission::Remove(id) => Request::Remove(id),
        })
    }
}

/// Submits changes to the service. Only one submission can be in flight at a time; a second one
/// started meanwhile fails with `ErrorType::Busy` without doing anything.
///
/// The editor does not reload anything itself. After a successful submission the caller must
/// reload the transactions before trusting any view derived from them.
#[derive(Debug, Default)]
pub struct Editor {
    gate: tokio::sync::Mutex<()>,
    state: Mutex<EditorState>,
    outcome: Mutex<Option<EditorState>>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditorState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `Succeeded` or `Failed` for the most recent submission that got past the busy check.
    pub fn last_outcome(&self) -> Option<EditorState> {
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: EditorState) {
        debug!("Editor state: {state}");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Validates `draft` and sends it as a new transaction.
    pub async fn create(
        &self,
        api: &dyn Api,
        credential: Option<&Credential>,
        draft: &TransactionDraft,
    ) -> Result<()> {
        self.submit(api, credential, Submission::Create(draft)).await
    }

    /// Validates `draft` and sends it as the full replacement of transaction `id`.
    pub async fn update(
        &self,
        api: &dyn Api,
        credential: Option<&Credential>,
        id: &TransactionId,
        draft: &TransactionDraft,
    ) -> Result<()> {
        self.submit(api, credential, Submission::Update(id, draft))
            .await
    }

    /// Deletes transaction `id`. Asking the user for confirmation is up to the caller.
    pub async fn remove(
        &self,
        api: &dyn Api,
        credential: Option<&Credential>,
        id: &TransactionId,
    ) -> Result<()> {
        self.submit(api, credential, Submission::Remove(id)).await
    }

    async fn submit(
        &self,
        api: &dyn Api,
        credential: Option<&Credential>,
        submission: Submission<'_>,
    ) -> Result<()> {
        let _gate = self.gate.try_lock().map_err(|_| {
            Error::new(
                ErrorType::Busy,
                "Another change is still being saved, please wait",
            )
        })?;
        let result = self.run(api, credential, submission).await;
        let outcome = match &result {
            Ok(()) => {
                info!("Saved {submission}");
                EditorState::Succeeded
            }
            Err(e) => {
                warn!("Unable to save {submission}: {e:#}");
                EditorState::Failed
            }
        };
        self.set_state(outcome);
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
        self.set_state(EditorState::Idle);
        result
    }

    async fn run(
        &self,
        api: &dyn Api,
        credential: Option<&Credential>,
        submission: Submission<'_>,
    ) -> Result<()> {
        self.set_state(EditorState::Validating);
        let request = submission.prepare()?;
        let credential = credential.ok_or_else(not_signed_in)?;

        self.set_state(EditorState::Submitting);
        match request {
            Request::Create(body) => api.create_transaction(credential, &body).await,
            Request::Update(id, body) => api.update_transaction(credential, id, &body).await,
            Request::Remove(id) => api.delete_transaction(credential, id).await,
        }
    }
}
