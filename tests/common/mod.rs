//! Fake donation backend bound to an ephemeral local port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::sync::Semaphore;
use serde_json::{json, Value};
use url::Url;

use donation_inventory::upstream::DonationProxy;
use donation_inventory::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Every request answers with this status and an empty body.
    Status(u16),
    /// Every request answers 200 with a body that is not JSON.
    Garbage,
}

#[derive(Default)]
struct Inner {
    records: Vec<Value>,
    next_id: i64,
    mode: Option<Mode>,
    last_body: Option<Value>,
    last_content_type: Option<String>,
    hits: usize,
}

/// Holds requests at the door while stalled, until released.
struct Gate {
    stalled: AtomicBool,
    waiting: AtomicUsize,
    permits: Semaphore,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            stalled: AtomicBool::new(false),
            waiting: AtomicUsize::new(0),
            permits: Semaphore::new(0),
        }
    }
}

async fn gatekeeper(State(gate): State<Arc<Gate>>, request: Request, next: Next) -> Response {
    if gate.stalled.load(Ordering::SeqCst) {
        gate.waiting.fetch_add(1, Ordering::SeqCst);
        if let Ok(permit) = gate.permits.acquire().await {
            permit.forget();
        }
        gate.waiting.fetch_sub(1, Ordering::SeqCst);
    }
    next.run(request).await
}

#[derive(Clone)]
pub struct FakeUpstream {
    pub base_url: Url,
    inner: Arc<Mutex<Inner>>,
    gate: Arc<Gate>,
}

impl FakeUpstream {
    pub fn set_mode(&self, mode: Mode) {
        self.inner.lock().unwrap().mode = Some(mode);
    }

    pub fn records(&self) -> Vec<Value> {
        self.inner.lock().unwrap().records.clone()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.inner.lock().unwrap().last_body.clone()
    }

    pub fn last_content_type(&self) -> Option<String> {
        self.inner.lock().unwrap().last_content_type.clone()
    }

    pub fn hits(&self) -> usize {
        self.inner.lock().unwrap().hits
    }

    /// Requests arriving from now on wait until `release`.
    pub fn stall(&self) {
        self.gate.stalled.store(true, Ordering::SeqCst);
    }

    /// Lets every held request through and stops stalling new ones.
    pub fn release(&self) {
        self.gate.stalled.store(false, Ordering::SeqCst);
        self.gate.permits.add_permits(self.gate.waiting.load(Ordering::SeqCst));
    }

    pub fn waiting(&self) -> usize {
        self.gate.waiting.load(Ordering::SeqCst)
    }

    /// Polls until `n` requests are held at the gate.
    pub async fn wait_for_stalled(&self, n: usize) {
        while self.waiting() < n {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    pub fn proxy(&self) -> DonationProxy {
        DonationProxy::new(self.base_url.clone()).expect("valid base url")
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.proxy()).expect("templates load")
    }
}

pub fn record(id: i64, donor_name: &str, donation_type: &str, amount: f64, date: &str) -> Value {
    json!({
        "id": id,
        "donor_name": donor_name,
        "donation_type": donation_type,
        "amount": amount,
        "date": date,
    })
}

fn intercept(inner: &mut Inner, headers: &HeaderMap, body: Option<&Value>) -> Option<Response> {
    inner.hits += 1;
    inner.last_body = body.cloned();
    inner.last_content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    match inner.mode.unwrap_or(Mode::Normal) {
        Mode::Normal => None,
        Mode::Status(code) => Some(StatusCode::from_u16(code).unwrap().into_response()),
        Mode::Garbage => Some((StatusCode::OK, "<html>not json</html>").into_response()),
    }
}

type Shared = Arc<Mutex<Inner>>;

async fn list(State(inner): State<Shared>, headers: HeaderMap) -> Response {
    let mut inner = inner.lock().unwrap();
    if let Some(r) = intercept(&mut inner, &headers, None) {
        return r;
    }
    Json(Value::Array(inner.records.clone())).into_response()
}

async fn create(State(inner): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut inner = inner.lock().unwrap();
    if let Some(r) = intercept(&mut inner, &headers, Some(&body)) {
        return r;
    }
    let mut created = body;
    created["id"] = json!(inner.next_id);
    inner.next_id += 1;
    inner.records.push(created.clone());
    Json(created).into_response()
}

async fn get_one(Path(id): Path<i64>, State(inner): State<Shared>, headers: HeaderMap) -> Response {
    let mut inner = inner.lock().unwrap();
    if let Some(r) = intercept(&mut inner, &headers, None) {
        return r;
    }
    match inner.records.iter().find(|r| r["id"] == json!(id)) {
        Some(found) => Json(found.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))).into_response(),
    }
}

async fn update(
    Path(id): Path<i64>,
    State(inner): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut inner = inner.lock().unwrap();
    if let Some(r) = intercept(&mut inner, &headers, Some(&body)) {
        return r;
    }
    let mut updated = body;
    updated["id"] = json!(id);
    match inner.records.iter_mut().find(|r| r["id"] == json!(id)) {
        Some(slot) => {
            *slot = updated.clone();
            Json(updated).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete(Path(id): Path<i64>, State(inner): State<Shared>, headers: HeaderMap) -> Response {
    let mut inner = inner.lock().unwrap();
    if let Some(r) = intercept(&mut inner, &headers, None) {
        return r;
    }
    let before = inner.records.len();
    inner.records.retain(|r| r["id"] != json!(id));
    if inner.records.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Starts the fake backend with the given records; new ids start at `next_id`.
pub async fn spawn_upstream(records: Vec<Value>, next_id: i64) -> FakeUpstream {
    let inner = Arc::new(Mutex::new(Inner {
        records,
        next_id,
        ..Default::default()
    }));
    let gate = Arc::new(Gate::default());
    let app = Router::new()
        .route("/donations", get(list).post(create))
        .route("/donations/{id}", get(get_one).put(update).delete(delete))
        .with_state(inner.clone())
        .layer(middleware::from_fn_with_state(gate.clone(), gatekeeper));

    let addr = serve(app).await;
    FakeUpstream {
        base_url: Url::parse(&format!("http://{}", addr)).unwrap(),
        inner,
        gate,
    }
}

/// Serves `app` on an ephemeral port and returns the bound address.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A base URL nothing is listening on.
pub async fn unreachable_base_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}", addr)).unwrap()
}
