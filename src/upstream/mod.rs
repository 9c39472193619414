//! Forwarding client for the external donation service.
//!
//! Every call is a single best-effort request against
//! `{API_BASE_URL}/donations[/{id}]`: no retries, no timeout, no caching.
//! Outcomes are classified into success, not-found (keyed calls only) and a
//! generic upstream failure.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    fn method(&self) -> Method {
        match self {
            Operation::List | Operation::Get => Method::GET,
            Operation::Create => Method::POST,
            Operation::Update => Method::PUT,
            Operation::Delete => Method::DELETE,
        }
    }

    /// Keyed operations address a single donation and may report not-found.
    fn is_keyed(&self) -> bool {
        matches!(self, Operation::Get | Operation::Update | Operation::Delete)
    }

    fn route(&self) -> &'static str {
        if self.is_keyed() {
            "/donations/{id}"
        } else {
            "/donations"
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::List => "Failed to fetch donations",
            Operation::Get => "Failed to fetch donation",
            Operation::Create => "Failed to create donation",
            Operation::Update => "Failed to update donation",
            Operation::Delete => "Failed to delete donation",
        }
    }
}

pub const NOT_FOUND_MESSAGE: &str = "Donation not found";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,
    #[error("{}: {reason}", .operation.failure_message())]
    Upstream { operation: Operation, reason: String },
}

impl ProxyError {
    pub fn upstream(operation: Operation, reason: impl ToString) -> Self {
        ProxyError::Upstream {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NotFound => StatusCode::NOT_FOUND,
            ProxyError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message exposed to callers. Upstream reasons stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::NotFound => NOT_FOUND_MESSAGE,
            ProxyError::Upstream { operation, .. } => operation.failure_message(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[derive(Clone, Debug)]
pub struct DonationProxy {
    client: Client,
    base_url: Url,
}

impl DonationProxy {
    pub fn new(base_url: Url) -> anyhow::Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: Url) -> anyhow::Result<Self> {
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot carry a path: {}", base_url);
        }
        Ok(Self { client, base_url })
    }

    pub async fn list(&self) -> Result<Value, ProxyError> {
        let response = self.forward(Operation::List, None, None).await?;
        read_json(Operation::List, response).await
    }

    pub async fn get(&self, id: &str) -> Result<Value, ProxyError> {
        let response = self.forward(Operation::Get, Some(id), None).await?;
        read_json(Operation::Get, response).await
    }

    pub async fn create(&self, body: &Value) -> Result<Value, ProxyError> {
        let response = self.forward(Operation::Create, None, Some(body)).await?;
        read_json(Operation::Create, response).await
    }

    pub async fn update(&self, id: &str, body: &Value) -> Result<Value, ProxyError> {
        let response = self.forward(Operation::Update, Some(id), Some(body)).await?;
        read_json(Operation::Update, response).await
    }

    /// The upstream body of a successful delete is ignored.
    pub async fn delete(&self, id: &str) -> Result<(), ProxyError> {
        self.forward(Operation::Delete, Some(id), None).await?;
        Ok(())
    }

    fn url_for(&self, id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected at construction
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("donations");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    async fn forward(
        &self,
        operation: Operation,
        id: Option<&str>,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ProxyError> {
        let url = self.url_for(id);
        tracing::debug!(method = %operation.method(), %url, "forwarding donation request");

        let mut request = self.client.request(operation.method(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return Err(log_failure(operation, ProxyError::upstream(operation, e))),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND && operation.is_keyed() {
            tracing::info!("{} {}: upstream reported not found", operation.method(), operation.route());
            return Err(ProxyError::NotFound);
        }
        Err(log_failure(
            operation,
            ProxyError::upstream(operation, format!("API responded with status: {}", status.as_u16())),
        ))
    }
}

async fn read_json(operation: Operation, response: reqwest::Response) -> Result<Value, ProxyError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| log_failure(operation, ProxyError::upstream(operation, e)))
}

fn log_failure(operation: Operation, err: ProxyError) -> ProxyError {
    tracing::error!("Error in {} {}: {}", operation.method(), operation.route(), err);
    err
}
