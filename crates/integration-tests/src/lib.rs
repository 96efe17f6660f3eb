//! Integration test support for the order portal client.
//!
//! [`MockBackend`] is a real HTTP server (axum on `127.0.0.1:0`) that answers
//! from a script, counts hits per route and records every request.
//! [`TestClient`] builds a `PortalClient` against it with in-memory storage
//! and recording hooks, so tests can assert on notices, navigation and
//! backoff delays without waiting for them.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p order-portal-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use order_portal_client::notify::{RecordingNavigator, RecordingNotifier};
use order_portal_client::retry::RecordingSleeper;
use order_portal_client::storage::keys;
use order_portal_client::{ClientConfig, MemoryStorage, PortalClient, Storage};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Base path the mock serves under.
pub const BASE_PATH: &str = "/api/v3";

// =============================================================================
// Scripted responses
// =============================================================================

#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Text(String),
    /// Send the request body back.
    Echo,
}

/// One scripted answer.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    reply: Reply,
    delay: Duration,
}

impl MockResponse {
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("valid status"),
            reply: Reply::Json(body),
            delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("valid status"),
            reply: Reply::Text(body.to_owned()),
            delay: Duration::ZERO,
        }
    }

    /// 200 with the request body as the response body.
    #[must_use]
    pub const fn echo() -> Self {
        Self {
            status: StatusCode::OK,
            reply: Reply::Echo,
            delay: Duration::ZERO,
        }
    }

    /// Hold the answer back for `delay`.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A request as the mock received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path and query, e.g. `/api/v3/materials?process=cnc-lathe`.
    pub target: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Default)]
struct Script {
    queued: HashMap<String, VecDeque<MockResponse>>,
    sticky: HashMap<String, MockResponse>,
    hits: HashMap<String, usize>,
    requests: Vec<RecordedRequest>,
}

type SharedScript = Arc<Mutex<Script>>;

fn route_key(method: &Method, target: &str) -> String {
    format!("{method} {target}")
}

// =============================================================================
// MockBackend
// =============================================================================

/// Scripted HTTP backend.
pub struct MockBackend {
    addr: SocketAddr,
    script: SharedScript,
    server: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl MockBackend {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        let script = SharedScript::default();

        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&script));
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend");
        });

        Self {
            addr,
            script,
            server,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Origin, e.g. `http://127.0.0.1:41234`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing here, default retry policy.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.url()).expect("mock url")
    }

    /// Answer `method endpoint` with `response` from now on.
    ///
    /// `endpoint` is relative to [`BASE_PATH`] and may carry a query.
    pub fn respond(&self, method: Method, endpoint: &str, response: MockResponse) {
        let key = route_key(&method, &format!("{BASE_PATH}{endpoint}"));
        self.lock().sticky.insert(key, response);
    }

    /// Answer the next calls with `responses` in order, then fall back to
    /// the sticky answer (or 404).
    pub fn respond_sequence(&self, method: Method, endpoint: &str, responses: Vec<MockResponse>) {
        let key = route_key(&method, &format!("{BASE_PATH}{endpoint}"));
        self.lock().queued.entry(key).or_default().extend(responses);
    }

    /// How often `method endpoint` was requested.
    #[must_use]
    pub fn hits(&self, method: Method, endpoint: &str) -> usize {
        let key = route_key(&method, &format!("{BASE_PATH}{endpoint}"));
        self.lock().hits.get(&key).copied().unwrap_or(0)
    }

    /// Every request so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// The most recent request to `endpoint`.
    #[must_use]
    pub fn last_request(&self, endpoint: &str) -> Option<RecordedRequest> {
        let target = format!("{BASE_PATH}{endpoint}");
        self.lock()
            .requests
            .iter()
            .rev()
            .find(|r| r.target == target)
            .cloned()
    }
}

async fn handle(
    State(script): State<SharedScript>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_owned(), |pq| pq.as_str().to_owned());
    let key = route_key(&method, &target);
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };

    let response = {
        let mut script = script.lock().unwrap_or_else(PoisonError::into_inner);
        *script.hits.entry(key.clone()).or_default() += 1;
        script.requests.push(RecordedRequest {
            method,
            target,
            authorization: header_value(header::AUTHORIZATION),
            content_type: header_value(header::CONTENT_TYPE),
            body: body.clone(),
        });
        let queued = script.queued.get_mut(&key).and_then(VecDeque::pop_front);
        queued.or_else(|| script.sticky.get(&key).cloned())
    };

    let Some(response) = response else {
        return (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({ "detail": "Not Found" })),
        )
            .into_response();
    };

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    match response.reply {
        Reply::Json(value) => (response.status, axum::Json(value)).into_response(),
        Reply::Text(text) => (response.status, text).into_response(),
        Reply::Echo => (
            response.status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
    }
}

/// Configuration for a backend that refuses connections.
pub async fn unreachable_config() -> ClientConfig {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind free port");
    let addr = listener.local_addr().expect("local address");
    drop(listener);

    let mut config = ClientConfig::new(&format!("http://{addr}")).expect("unreachable url");
    config.request_timeout = Duration::from_secs(5);
    config
}

// =============================================================================
// TestClient
// =============================================================================

/// A `PortalClient` with in-memory storage and recording hooks.
pub struct TestClient {
    pub client: PortalClient,
    pub storage: Arc<MemoryStorage>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub sleeper: Arc<RecordingSleeper>,
}

impl TestClient {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_storage(config, Arc::new(MemoryStorage::new()))
    }

    /// A client whose stored session already holds `token`.
    #[must_use]
    pub fn signed_in(config: ClientConfig, token: &str) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::TOKEN, token).expect("memory storage");
        Self::with_storage(config, storage)
    }

    /// Build over existing storage, e.g. to test restoring a session.
    #[must_use]
    pub fn with_storage(config: ClientConfig, storage: Arc<MemoryStorage>) -> Self {
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let sleeper = Arc::new(RecordingSleeper::new());

        let client = PortalClient::builder(config, storage.clone())
            .notifier(notifier.clone())
            .navigator(navigator.clone())
            .sleeper(sleeper.clone())
            .build()
            .expect("build client");

        Self {
            client,
            storage,
            notifier,
            navigator,
            sleeper,
        }
    }
}
