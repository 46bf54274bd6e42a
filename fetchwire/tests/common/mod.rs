//! In-process axum server used by the integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use fetchwire::{Client, ClientBuilder};

/// Request counters shared with the handlers.
#[derive(Default)]
pub struct Hits {
    pub ok: AtomicUsize,
    pub flaky: AtomicUsize,
}

impl Hits {
    pub fn ok(&self) -> usize {
        self.ok.load(Ordering::SeqCst)
    }
}

pub struct TestServer {
    pub base_url: String,
    pub hits: Arc<Hits>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Builder with the base URL pointing at this server.
    pub fn client_builder(&self) -> ClientBuilder {
        Client::builder().base_url(&self.base_url)
    }

    pub fn client(&self) -> Client {
        self.client_builder().build().unwrap()
    }
}

/// Start a server on an ephemeral local port.
pub async fn start() -> TestServer {
    let hits = Arc::new(Hits::default());

    let app = Router::new()
        .route("/ok", get(ok))
        .route("/fail", get(fail))
        .route("/empty", get(|| async {}))
        .route("/json", get(json))
        .route("/large", get(large))
        .route("/headers", get(headers))
        .route("/query", get(query))
        .route("/echo", post(echo).put(echo).patch(echo).delete(echo))
        .route("/method", axum::routing::any(method))
        .route("/delay", get(delay))
        .route("/slow", get(slow))
        .route("/flaky", get(flaky))
        .route("/redirect", get(redirect))
        .fallback(not_found)
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        hits,
    }
}

async fn ok(State(hits): State<Arc<Hits>>) -> &'static str {
    hits.ok.fetch_add(1, Ordering::SeqCst);
    "ok"
}

async fn fail() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal failure")
}

async fn not_found(uri: Uri) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("no route for {}", uri.path()))
}

async fn json() -> impl IntoResponse {
    Json(serde_json::json!({ "id": 1, "title": "hello" }))
}

async fn large() -> Vec<u8> {
    vec![b'x'; 1024 * 1024]
}

/// Every `x-*` header with all of its values, in arrival order.
async fn headers(headers: HeaderMap) -> Json<BTreeMap<String, Vec<String>>> {
    let mut seen = BTreeMap::new();
    for name in headers.keys().filter(|n| n.as_str().starts_with("x-")) {
        let values = headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap_or_default().to_string())
            .collect();
        seen.insert(name.to_string(), values);
    }
    Json(seen)
}

async fn query(RawQuery(query): RawQuery) -> String {
    query.unwrap_or_default()
}

/// Echo the body back with the request's content type.
async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    ([(header::CONTENT_TYPE, content_type)], body)
}

async fn method(method: axum::http::Method) -> String {
    method.to_string()
}

async fn delay() -> &'static str {
    tokio::time::sleep(Duration::from_millis(100)).await;
    "done"
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(10)).await;
    "late"
}

/// Fails twice with 503, then succeeds.
async fn flaky(State(hits): State<Arc<Hits>>) -> (StatusCode, &'static str) {
    if hits.flaky.fetch_add(1, Ordering::SeqCst) < 2 {
        (StatusCode::SERVICE_UNAVAILABLE, "try again")
    } else {
        (StatusCode::OK, "recovered")
    }
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/ok")])
}
