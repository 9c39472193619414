use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json as AxumJson,
};
use serde_json::{json, Value};

use crate::upstream::{Operation, ProxyError};
use crate::AppState;

/// Request bodies are relayed as-is, but must at least be JSON. A malformed
/// body fails the operation with the usual envelope instead of an extractor
/// rejection.
fn parse_body(operation: Operation, body: &Bytes) -> Result<Value, ProxyError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::error!("Rejected {:?} request body: {}", operation, e);
        ProxyError::upstream(operation, e)
    })
}

pub async fn list_donations(State(state): State<AppState>) -> Result<AxumJson<Value>, ProxyError> {
    state.proxy.list().await.map(AxumJson)
}

pub async fn create_donation(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<AxumJson<Value>, ProxyError> {
    let body = parse_body(Operation::Create, &body)?;
    state.proxy.create(&body).await.map(AxumJson)
}

pub async fn get_donation(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<AxumJson<Value>, ProxyError> {
    state.proxy.get(&id).await.map(AxumJson)
}

pub async fn update_donation(
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<AxumJson<Value>, ProxyError> {
    let body = parse_body(Operation::Update, &body)?;
    state.proxy.update(&id, &body).await.map(AxumJson)
}

pub async fn delete_donation(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<AxumJson<Value>, ProxyError> {
    state.proxy.delete(&id).await?;
    Ok(AxumJson(json!({ "success": true })))
}
