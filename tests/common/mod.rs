//! Shared test utilities for integration tests.
//!
//! `FakeBackend` serves the content backend's API from an axum router on an
//! ephemeral port and records every call it receives. `TestClient` wires an
//! `AppState` to it with an in-memory database and a manual clock.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use basecamp::config::Config;
use basecamp::db::{create_in_memory_pool, migrations};
use basecamp::handlers;
use basecamp::models::{ImportJob, ImportRequest, ImportSource};
use basecamp::services::clock::ManualClock;
use basecamp::state::AppState;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower::ServiceExt;

/// One request seen by the fake backend.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub body: Value,
}

struct FakeInner {
    calls: Mutex<Vec<RecordedCall>>,
    import_status: Mutex<u16>,
    import_body: Mutex<Value>,
    failing_transcripts: Mutex<HashSet<i64>>,
    bulk_status: Mutex<u16>,
    listing: Mutex<Vec<Value>>,
    import_gate: Mutex<Option<Arc<Notify>>>,
}

#[derive(Clone)]
pub struct FakeBackend {
    pub url: String,
    inner: Arc<FakeInner>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let inner = Arc::new(FakeInner {
            calls: Mutex::new(Vec::new()),
            import_status: Mutex::new(200),
            import_body: Mutex::new(json!({"count": 0, "skipped": 0, "importedItems": []})),
            failing_transcripts: Mutex::new(HashSet::new()),
            bulk_status: Mutex::new(200),
            listing: Mutex::new(Vec::new()),
            import_gate: Mutex::new(None),
        });

        let mut router = Router::new()
            .route("/import/:source", post(fake_import))
            .route("/videos/:id/transcript", post(fake_transcript));
        for item_type in ["posts", "videos"] {
            router = router
                .route(
                    &format!("/{}", item_type),
                    get(fake_list).delete(fake_bulk),
                )
                .route(&format!("/{}/bulk-category", item_type), patch(fake_bulk))
                .route(&format!("/{}/bulk-status", item_type), patch(fake_bulk));
        }
        let router = router.with_state(inner.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            inner,
        }
    }

    /// Respond to the bulk-import call with `count`, `skipped` and one
    /// imported item per `(id, title)`.
    pub fn set_import_result(&self, count: u32, skipped: u32, items: &[(i64, &str)]) {
        let items: Vec<Value> = items
            .iter()
            .map(|(id, title)| json!({"id": id, "title": title}))
            .collect();
        *self.inner.import_body.lock().unwrap() =
            json!({"count": count, "skipped": skipped, "importedItems": items});
    }

    /// Respond to the bulk-import call with an arbitrary JSON body.
    pub fn set_import_body(&self, body: Value) {
        *self.inner.import_body.lock().unwrap() = body;
    }

    pub fn set_import_status(&self, status: u16) {
        *self.inner.import_status.lock().unwrap() = status;
    }

    pub fn fail_transcript(&self, id: i64) {
        self.inner.failing_transcripts.lock().unwrap().insert(id);
    }

    pub fn set_bulk_status(&self, status: u16) {
        *self.inner.bulk_status.lock().unwrap() = status;
    }

    pub fn set_listing(&self, rows: Value) {
        *self.inner.listing.lock().unwrap() = rows.as_array().cloned().unwrap_or_default();
    }

    /// Hold bulk-import requests until `release_import` is called.
    pub fn hold_imports(&self) {
        *self.inner.import_gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub fn release_import(&self) {
        if let Some(gate) = self.inner.import_gate.lock().unwrap().as_ref() {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, needle: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.path.contains(needle))
            .collect()
    }

    /// Number of listing fetches for `path`, e.g. `/posts`.
    pub fn listing_fetches(&self, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == "GET" && c.path == path)
            .count()
    }

    pub fn transcript_calls(&self) -> Vec<i64> {
        self.calls_matching("/transcript")
            .iter()
            .filter_map(|c| c.path.split('/').nth(2).and_then(|id| id.parse().ok()))
            .collect()
    }
}

fn record(inner: &FakeInner, method: &str, path: String, body: Value) {
    inner.calls.lock().unwrap().push(RecordedCall {
        method: method.to_string(),
        path,
        body,
    });
}

async fn fake_import(
    State(inner): State<Arc<FakeInner>>,
    Path(source): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    record(&inner, "POST", format!("/import/{}", source), body);

    let gate = inner.import_gate.lock().unwrap().clone();
    if let Some(gate) = gate {
        gate.notified().await;
    }

    let status = *inner.import_status.lock().unwrap();
    if status != 200 {
        let code = StatusCode::from_u16(status).unwrap();
        return (code, "upstream exploded").into_response();
    }
    Json(inner.import_body.lock().unwrap().clone()).into_response()
}

async fn fake_transcript(State(inner): State<Arc<FakeInner>>, Path(id): Path<i64>) -> Response {
    record(&inner, "POST", format!("/videos/{}/transcript", id), Value::Null);
    if inner.failing_transcripts.lock().unwrap().contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "no captions").into_response();
    }
    Json(json!({"ok": true})).into_response()
}

async fn fake_list(State(inner): State<Arc<FakeInner>>, request: Request<Body>) -> Response {
    record(&inner, "GET", request.uri().path().to_string(), Value::Null);
    Json(inner.listing.lock().unwrap().clone()).into_response()
}

async fn fake_bulk(State(inner): State<Arc<FakeInner>>, request: Request<Body>) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let bytes = request.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    record(&inner, &method, path, body);

    let status = StatusCode::from_u16(*inner.bulk_status.lock().unwrap()).unwrap();
    (status, Json(json!({"ok": status.is_success()}))).into_response()
}

/// Application state wired to a fake backend.
pub struct TestClient {
    state: AppState,
    pub backend: FakeBackend,
    pub clock: Arc<ManualClock>,
}

impl TestClient {
    pub async fn new() -> Self {
        Self::with_close_delay(Config::default().close_delay).await
    }

    pub async fn with_close_delay(close_delay: Duration) -> Self {
        let backend = FakeBackend::start().await;

        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
        {
            let conn = pool.get().expect("Failed to get connection");
            migrations::run_migrations(&conn).expect("Failed to run migrations");
        }

        let config = Config {
            host: "127.0.0.1".into(),
            port: 7070,
            backend_url: backend.url.clone(),
            request_timeout: Duration::from_secs(5),
            close_delay,
            ..Config::default()
        };

        let clock = Arc::new(ManualClock::default());
        let state = AppState::new(config, pool, clock.clone()).expect("Failed to build state");

        Self {
            state,
            backend,
            clock,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        handlers::routes().with_state(self.state.clone())
    }

    pub fn request(limit: u32) -> ImportRequest {
        ImportRequest {
            source_id: "UC-trailhead".into(),
            limit,
            category_id: None,
        }
    }

    /// Run a full import directly through the importer.
    pub async fn run_import(
        &self,
        source: ImportSource,
        limit: u32,
    ) -> basecamp::error::AppResult<basecamp::services::importer::ImportSummary> {
        self.state.importer().run(source, Self::request(limit)).await
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, String) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> (StatusCode, String) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, uri: &str) -> (StatusCode, T) {
        let (status, body) = self.get(uri).await;
        let parsed = serde_json::from_str(&body)
            .unwrap_or_else(|e| panic!("invalid JSON from {}: {} ({})", uri, e, body));
        (status, parsed)
    }

    /// Wait until the tracker publishes a finished job.
    pub async fn wait_for_finish(
        &self,
        rx: &mut tokio::sync::broadcast::Receiver<Arc<ImportJob>>,
    ) -> Arc<ImportJob> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let job = rx.recv().await.expect("tracker channel closed");
                if job.outcome.is_finished() {
                    return job;
                }
            }
        })
        .await
        .expect("import did not finish in time")
    }
}
