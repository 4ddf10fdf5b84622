//! Implements the `Api` trait in memory, emulating the tracker service.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a running service. It behaves like the real one where the client
//! depends on it: ids and timestamps are assigned on create, listings are newest first, and saving
//! an expense with an unknown category or subcategory adds it to the taxonomy.

use crate::api::{unauthorized, Api, Credential, Op};
use crate::error::{Res, Result};
use crate::model::{
    parse_timestamp, Amount, Taxonomy, Transaction, TransactionBody, TransactionId,
    TransactionType,
};
use anyhow::Context;
use chrono::Utc;
use serde::Deserialize;
use std::io::Cursor;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{trace, warn};

/// The data held by the in-memory service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestState {
    pub transactions: Vec<Transaction>,
    pub taxonomy: Taxonomy,
}

#[derive(Debug, Default)]
struct Inner {
    state: TestState,
    next_id: u64,
    accepted_token: Option<String>,
    requests: usize,
    fail_on: Option<(usize, Option<String>)>,
}

/// An in-memory service. Clones share the same data, so a test can keep one handle to inspect or
/// tamper with the service while a `Session` uses another.
#[derive(Debug, Clone)]
pub struct TestClient {
    inner: Arc<Mutex<Inner>>,
}

impl TestClient {
    pub fn new(state: TestState) -> Self {
        let next_id = state
            .transactions
            .iter()
            .filter_map(|t| t.id().as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                next_id,
                ..Default::default()
            })),
        }
    }

    /// A service with no transactions and an empty taxonomy.
    pub fn empty() -> Self {
        Self::new(TestState::default())
    }

    /// Only `token` will be accepted from now on; any other credential gets a 401.
    pub fn accept_only(&self, token: impl Into<String>) {
        self.lock().accepted_token = Some(token.into());
    }

    /// Makes the next request fail. `message` is what the service puts in its error body, if
    /// anything.
    pub fn fail_next(&self, message: Option<&str>) {
        let next = self.requests() + 1;
        self.fail_on(next, message);
    }

    /// Makes the `request`th request (counting from 1 since this client was created) fail.
    pub fn fail_on(&self, request: usize, message: Option<&str>) {
        self.lock().fail_on = Some((request, message.map(str::to_string)));
    }

    /// The number of requests received so far.
    pub fn requests(&self) -> usize {
        self.lock().requests
    }

    pub fn state(&self) -> TestState {
        self.lock().state.clone()
    }

    pub fn set_state(&self, state: TestState) {
        self.lock().state = state;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the request and applies the credential check and any injected failure.
    fn receive(&self, op: Op, credential: &Credential) -> Result<MutexGuard<'_, Inner>> {
        trace!("{op:?} received by the in-memory service");
        let mut inner = self.lock();
        inner.requests += 1;
        if let Some(accepted) = &inner.accepted_token {
            if accepted != credential.token() {
                return Err(unauthorized(Some("Token has expired".to_string())));
            }
        }
        if inner.fail_on.as_ref().map(|(n, _)| *n) == Some(inner.requests) {
            let message = inner.fail_on.take().and_then(|(_, message)| message);
            return Err(op.failure(message));
        }
        Ok(inner)
    }
}

impl Default for TestClient {
    /// Loads seed data from this module.
    fn default() -> Self {
        let state = seed_state().unwrap_or_else(|e| {
            warn!("Unable to load the seed data, starting empty: {e:#}");
            TestState::default()
        });
        Self::new(state)
    }
}

#[async_trait::async_trait]
impl Api for TestClient {
    async fn list_transactions(&self, credential: &Credential) -> Result<Vec<Transaction>> {
        let inner = self.receive(Op::ListTransactions, credential)?;
        let mut transactions = inner.state.transactions.clone();
        transactions.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        Ok(transactions)
    }

    async fn create_transaction(
        &self,
        credential: &Credential,
        body: &TransactionBody,
    ) -> Result<()> {
        let op = Op::CreateTransaction;
        let mut inner = self.receive(op, credential)?;
        let kind = match body.kind() {
            Some(kind) => kind,
            None => return Err(op.failure(Some("Transaction type is required".to_string()))),
        };
        let id = TransactionId::from(inner.next_id);
        inner.next_id += 1;
        let mut transaction = Transaction::new(id, kind, body.amount(), Utc::now());
        apply(&mut transaction, body);
        grow_taxonomy(&mut inner.state.taxonomy, &transaction);
        inner.state.transactions.push(transaction);
        Ok(())
    }

    async fn update_transaction(
        &self,
        credential: &Credential,
        id: &TransactionId,
        body: &TransactionBody,
    ) -> Result<()> {
        let op = Op::UpdateTransaction;
        let mut inner = self.receive(op, credential)?;
        let state = &mut inner.state;
        let transaction = match state.transactions.iter_mut().find(|t| t.id() == id) {
            Some(t) => t,
            None => return Err(op.failure(Some("Transaction not found".to_string()))),
        };
        transaction.amount = Some(body.amount());
        apply(transaction, body);
        let updated = transaction.clone();
        grow_taxonomy(&mut state.taxonomy, &updated);
        Ok(())
    }

    async fn delete_transaction(&self, credential: &Credential, id: &TransactionId) -> Result<()> {
        let op = Op::DeleteTransaction;
        let mut inner = self.receive(op, credential)?;
        let before = inner.state.transactions.len();
        inner.state.transactions.retain(|t| t.id() != id);
        if inner.state.transactions.len() == before {
            return Err(op.failure(Some("Transaction not found".to_string())));
        }
        Ok(())
    }

    async fn list_categories(&self, credential: &Credential) -> Result<Taxonomy> {
        let inner = self.receive(Op::ListCategories, credential)?;
        Ok(inner.state.taxonomy.clone())
    }
}

/// Copies the fields present in `body` onto `transaction`.
fn apply(transaction: &mut Transaction, body: &TransactionBody) {
    transaction.description = Some(body.description().to_string());
    if let Some(title) = body.title() {
        transaction.title = Some(title.to_string());
    }
    if let Some(source) = body.source() {
        transaction.source = Some(source.to_string());
    }
    if let Some(category) = body.category() {
        transaction.category = Some(category.to_string());
    }
    if let Some(subcategory) = body.subcategory() {
        transaction.subcategory = Some(subcategory.to_string());
    }
}

/// The service creates taxonomy entries implicitly when an expense uses them.
fn grow_taxonomy(taxonomy: &mut Taxonomy, transaction: &Transaction) {
    if transaction.kind() != TransactionType::Expense {
        return;
    }
    if let Some(category) = transaction.category() {
        taxonomy.insert(
            category.to_string(),
            transaction.subcategory().unwrap_or_default().to_string(),
        );
    }
}

#[derive(Debug, Deserialize)]
struct SeedTransaction {
    id: u64,
    #[serde(rename = "type")]
    kind: TransactionType,
    amount: String,
    timestamp: String,
    source: Option<String>,
    category: Option<String>,
    subcategory: Option<String>,
    title: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedCategory {
    category: String,
    subcategory: Option<String>,
}

/// Builds the seed state from the CSV data in this module.
fn seed_state() -> Res<TestState> {
    let mut transactions = Vec::new();
    for row in load_csv::<SeedTransaction>(TRANSACTION_DATA)? {
        let amount = Amount::from_str(&row.amount)
            .with_context(|| format!("Bad seed amount for transaction {}", row.id))?;
        let timestamp = parse_timestamp(&row.timestamp)?;
        let mut t = Transaction::new(row.id, row.kind, amount, timestamp);
        t.source = row.source;
        t.category = row.category;
        t.subcategory = row.subcategory;
        t.title = row.title;
        t.description = row.description;
        transactions.push(t);
    }

    let mut taxonomy = Taxonomy::default();
    for row in load_csv::<SeedCategory>(CATEGORY_DATA)? {
        taxonomy.insert(row.category, row.subcategory.unwrap_or_default());
    }

    Ok(TestState {
        transactions,
        taxonomy,
    })
}

/// Loads rows from a CSV-formatted string with a header row.
fn load_csv<T: serde::de::DeserializeOwned>(csv_data: &str) -> Res<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(csv_data.as_bytes()));
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result.context("Unable to parse seed CSV row")?);
    }
    Ok(rows)
}

/// Seed transaction data.
const TRANSACTION_DATA: &str = r##"id,type,amount,timestamp,source,category,subcategory,title,description
1,income,85000,2025-10-01T08:00:00Z,Salary,,,,October salary
2,expense,4500,2025-10-02T12:15:00Z,,Food,Groceries,,weekly shop
3,expense,1200,2025-10-03T07:40:00Z,,Transport,Fuel,,
4,income,15000,2025-10-05T16:00:00Z,Freelance Design,,,Logo,logo for a bakery
5,expense,3200,2025-10-06T19:30:00Z,,Utilities,Electricity,,token top-up
6,expense,850,2025-10-08T13:05:00Z,,Food,Restaurants,,lunch
7,income,2500,2025-10-10T10:00:00Z,Side Hustle,,,,
"##;

/// Seed category data.
const CATEGORY_DATA: &str = r##"category,subcategory
Food,Groceries
Food,Restaurants
Transport,Fuel
Transport,Bus Fare
Utilities,Electricity
Utilities,Water
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::model::{Intent, Novelty, TransactionDraft};

    fn credential() -> Credential {
        Credential::new("test-token").unwrap()
    }

    #[test]
    fn test_seed_data_loads() {
        let state = seed_state().unwrap();
        assert_eq!(state.transactions.len(), 7);
        assert_eq!(state.taxonomy.len(), 3);
        assert_eq!(
            state.taxonomy.classify_subcategory("Transport", "Bus Fare"),
            Novelty::Known
        );
        assert_eq!(state.transactions[2].description(), None);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let api = TestClient::default();
        let list = api.list_transactions(&credential()).await.unwrap();
        let ids: Vec<&str> = list.iter().map(|t| t.id().as_str()).collect();
        assert_eq!(ids, vec!["7", "6", "5", "4", "3", "2", "1"]);
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_grows_taxonomy() {
        let api = TestClient::default();
        let body = TransactionDraft::expense("300", "Health")
            .with_subcategory("Pharmacy")
            .validate(Intent::Create)
            .unwrap();
        api.create_transaction(&credential(), &body).await.unwrap();
        let state = api.state();
        let created = state.transactions.last().unwrap();
        assert_eq!(created.id().as_str(), "8");
        assert!(created.timestamp().is_some());
        assert_eq!(
            state.taxonomy.classify_subcategory("Health", "Pharmacy"),
            Novelty::Known
        );
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let api = TestClient::default();
        let body = TransactionDraft::expense("999", "Food")
            .with_subcategory("Snacks")
            .validate(Intent::Update)
            .unwrap();
        api.update_transaction(&credential(), &TransactionId::new("2"), &body)
            .await
            .unwrap();
        let state = api.state();
        let updated = state
            .transactions
            .iter()
            .find(|t| t.id().as_str() == "2")
            .unwrap();
        assert_eq!(updated.amount(), Some(Amount::from(999_i64)));
        assert_eq!(updated.subcategory(), Some("Snacks"));
        assert_eq!(updated.description(), Some(""));
        assert_eq!(updated.kind(), TransactionType::Expense);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let api = TestClient::default();
        let body = TransactionDraft::income("1", "x")
            .validate(Intent::Update)
            .unwrap();
        let err = api
            .update_transaction(&credential(), &TransactionId::new("404"), &body)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Transaction not found");
        let err = api
            .delete_transaction(&credential(), &TransactionId::new("404"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::SubmitFailed);
    }

    #[tokio::test]
    async fn test_fail_next_only_fails_once() {
        let api = TestClient::default();
        api.fail_next(None);
        let err = api.list_categories(&credential()).await.unwrap_err();
        assert_eq!(err.message(), "Failed to fetch categories");
        assert!(api.list_categories(&credential()).await.is_ok());
        assert_eq!(api.requests(), 2);
    }

    #[tokio::test]
    async fn test_wrong_token_is_auth_missing() {
        let api = TestClient::default();
        api.accept_only("right");
        let err = api
            .list_transactions(&Credential::new("wrong").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_auth_missing());
        assert!(api
            .list_transactions(&Credential::new("right").unwrap())
            .await
            .is_ok());
    }
}
