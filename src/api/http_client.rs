//! Implements the `Api` trait with `reqwest` against the real service.

use crate::api::{unauthorized, Api, Credential, Op, CATEGORIES_PATH, TRANSACTIONS_PATH};
use crate::error::{ErrorType, IntoResult, Res, Result};
use crate::model::{Taxonomy, Transaction, TransactionBody, TransactionId};
use crate::Config;
use anyhow::{anyhow, Context};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;
use tracing::{debug, trace, warn};

/// Talks HTTP+JSON to the service, sending the credential as a bearer token. Every request is
/// bounded by the configured timeout.
pub(crate) struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Unable to create the HTTP client")
            .pub_result(ErrorType::Config)?;
        Ok(Self {
            client,
            base_url: config.base_url().clone(),
        })
    }

    fn url(&self, path: &str) -> Res<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Unable to build a URL for '{path}'"))
    }

    /// `/api/transactions/{id}`, with the id percent-encoded as a single path segment.
    fn transaction_url(&self, id: &TransactionId) -> Res<Url> {
        let mut url = self.url(TRANSACTIONS_PATH)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("The base URL cannot have a path"))?
            .push(id.as_str());
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        url: Res<Url>,
        credential: &Credential,
    ) -> Res<RequestBuilder> {
        let url = url?;
        trace!("{method} {url}");
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(credential.token()))
    }

    /// Sends the request and returns the response if it was a success. Anything else is turned
    /// into the public error for `op`.
    async fn send(&self, op: Op, request: Res<RequestBuilder>) -> Result<Response> {
        let request = request.map_err(|e| op.transport(e))?;
        let response = request
            .send()
            .await
            .map_err(|e| op.transport(e.into()))?;
        let status = response.status();
        debug!("{op:?} answered {status}");
        if status.is_success() {
            return Ok(response);
        }
        let server_message = error_message(response).await;
        warn!(
            "{op:?} failed with status {status}: {}",
            server_message.as_deref().unwrap_or("no message")
        );
        if status == StatusCode::UNAUTHORIZED {
            return Err(unauthorized(server_message));
        }
        Err(op.failure(server_message))
    }

    async fn read_json<T: DeserializeOwned>(&self, op: Op, response: Response) -> Result<T> {
        let text = response.text().await.map_err(|e| op.transport(e.into()))?;
        serde_json::from_str(&text)
            .context("The service sent a response that could not be parsed")
            .map_err(|e| op.transport(e))
    }
}

#[async_trait::async_trait]
impl Api for HttpClient {
    async fn list_transactions(&self, credential: &Credential) -> Result<Vec<Transaction>> {
        let op = Op::ListTransactions;
        let request = self.request(Method::GET, self.url(TRANSACTIONS_PATH), credential);
        let response = self.send(op, request).await?;
        self.read_json(op, response).await
    }

    async fn create_transaction(
        &self,
        credential: &Credential,
        body: &TransactionBody,
    ) -> Result<()> {
        let request = self
            .request(Method::POST, self.url(TRANSACTIONS_PATH), credential)
            .map(|r| r.json(body));
        let _ = self.send(Op::CreateTransaction, request).await?;
        Ok(())
    }

    async fn update_transaction(
        &self,
        credential: &Credential,
        id: &TransactionId,
        body: &TransactionBody,
    ) -> Result<()> {
        let request = self
            .request(Method::PUT, self.transaction_url(id), credential)
            .map(|r| r.json(body));
        let _ = self.send(Op::UpdateTransaction, request).await?;
        Ok(())
    }

    async fn delete_transaction(&self, credential: &Credential, id: &TransactionId) -> Result<()> {
        let request = self.request(Method::DELETE, self.transaction_url(id), credential);
        let _ = self.send(Op::DeleteTransaction, request).await?;
        Ok(())
    }

    async fn list_categories(&self, credential: &Credential) -> Result<Taxonomy> {
        let op = Op::ListCategories;
        let request = self.request(Method::GET, self.url(CATEGORIES_PATH), credential);
        let response = self.send(op, request).await?;
        self.read_json(op, response).await
    }
}

/// Pulls the human-readable message out of an error body, e.g. `{"error": "Invalid amount"}`.
/// Token middleware tends to use `msg` instead of `error`.
async fn error_message(response: Response) -> Option<String> {
    let text = response.text().await.ok()?;
    let value: serde_json::Value = serde_json::from_str(&text).ok()?;
    ["error", "msg", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
