#![allow(dead_code)]

use std::net::SocketAddr;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use shopforum_api::config::AppConfig;
use shopforum_api::filter::Filter;
use shopforum_api::state::AppState;
use shopforum_api::store::{MemoryStore, Store, Table};

pub const STORE_KEY: &str = "test-key";

/// Store contents shared by the router and backend tests
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store
        .seed(
            Table::Users,
            [
                json!({"id": 1, "username": "alice", "role": "admin"}),
                json!({"id": 7, "username": "bob", "role": "member"}),
            ],
        )
        .await;
    store
        .seed(
            Table::Products,
            [
                json!({"id": 1, "name": "Laptop", "category": "electronics"}),
                json!({"id": 2, "name": "Phone", "category": "electronics"}),
                json!({"id": 3, "name": "Novel", "category": "books"}),
            ],
        )
        .await;
    store.seed(Table::Forums, [json!({"id": 1, "name": "General"})]).await;
    store
        .seed(
            Table::Threads,
            [
                json!({"id": 1, "forum_id": 1, "user_id": 7, "title": "Hello"}),
                json!({"id": 2, "forum_id": 2, "user_id": 1, "title": "Elsewhere"}),
            ],
        )
        .await;
    store
        .seed(Table::Posts, [json!({"id": 1, "thread_id": 1, "user_id": 1, "body": "Welcome"})])
        .await;
    Arc::new(store)
}

pub fn test_config(store_url: &str) -> AppConfig {
    let store_url = store_url.to_string();
    AppConfig::from_lookup(move |key| match key {
        "SUPABASE_URL" => Some(store_url.clone()),
        "SUPABASE_KEY" => Some(STORE_KEY.to_string()),
        _ => None,
    })
    .expect("test config")
}

/// Router over the seeded store with a small request body limit
pub async fn test_app_with_body_limit(limit: usize) -> Router {
    let limit = limit.to_string();
    let config = AppConfig::from_lookup(move |key| match key {
        "SUPABASE_URL" => Some("http://127.0.0.1:9".to_string()),
        "SUPABASE_KEY" => Some(STORE_KEY.to_string()),
        "API_MAX_REQUEST_SIZE_BYTES" => Some(limit.clone()),
        _ => None,
    })
    .expect("test config");
    let state = AppState::new(seeded_store().await, config);
    shopforum_api::app(state).expect("route table")
}

/// Router over an in-memory store, plus a handle on that store for assertions
pub async fn test_app() -> (Router, Arc<MemoryStore>) {
    let store = seeded_store().await;
    let state = AppState::new(store.clone(), test_config("http://127.0.0.1:9"));
    let app = shopforum_api::app(state).expect("route table");
    (app, store)
}

pub async fn send(app: &Router, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let body = body.map(|v| v.to_string());
    send_raw(app, method, uri, user, body.as_deref()).await
}

pub async fn send_raw(app: &Router, method: Method, uri: &str, user: Option<&str>, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("X-User", user);
    }
    let body = match body {
        Some(text) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(text.to_string())
        }
        None => Body::empty(),
    };

    send_request(app, builder.body(body).expect("request")).await
}

/// Drive a prebuilt request through the router and decode the JSON reply
pub async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("infallible router");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON response body")
    };
    (status, json)
}

// --- Mock PostgREST backend -------------------------------------------------

/// Serve the subset of PostgREST the API uses, backed by `store`
pub async fn spawn_backend(store: Arc<MemoryStore>) -> Result<SocketAddr> {
    let router = Router::new()
        .route("/rest/v1/", get(|| async { Json(json!({"swagger": "2.0"})) }))
        .route("/rest/v1/:table", any(table_endpoint))
        .with_state(store);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

fn pgrst_error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({"code": code, "message": message, "details": null, "hint": null}))).into_response()
}

async fn table_endpoint(
    State(store): State<Arc<MemoryStore>>,
    Path(table): Path<String>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(STORE_KEY) {
        return pgrst_error(StatusCode::UNAUTHORIZED, "PGRST301", "Invalid API key");
    }
    let Some(table) = Table::from_name(&table) else {
        return pgrst_error(StatusCode::NOT_FOUND, "42P01", "relation does not exist");
    };

    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .into_owned()
        .collect();
    let filter = match Filter::from_query_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))) {
        Ok(filter) => filter,
        Err(e) => return pgrst_error(StatusCode::BAD_REQUEST, "PGRST100", &e.to_string()),
    };

    let row = || -> Option<serde_json::Map<String, Value>> {
        serde_json::from_slice::<Value>(&body).ok()?.as_object().cloned()
    };

    match method.as_str() {
        "GET" => {
            let rows = store.select(table, &filter).await.expect("memory store");
            let single = headers
                .get(header::ACCEPT)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.contains("vnd.pgrst.object"))
                .unwrap_or(false);
            if !single {
                return Json(rows).into_response();
            }
            match <[_; 1]>::try_from(rows) {
                Ok([row]) => Json(row).into_response(),
                Err(_) => pgrst_error(
                    StatusCode::NOT_ACCEPTABLE,
                    "PGRST116",
                    "JSON object requested, multiple (or no) rows returned",
                ),
            }
        }
        "POST" => {
            let Some(row) = row() else {
                return pgrst_error(StatusCode::BAD_REQUEST, "PGRST102", "Invalid body");
            };
            if let Some(violation) = foreign_key_violation(&store, table, &row).await {
                return pgrst_error(StatusCode::CONFLICT, "23503", &violation);
            }
            let rows = store.insert(table, row).await.expect("memory store");
            (StatusCode::CREATED, Json(rows)).into_response()
        }
        "PATCH" => {
            let Some(changes) = row() else {
                return pgrst_error(StatusCode::BAD_REQUEST, "PGRST102", "Invalid body");
            };
            Json(store.update(table, changes, &filter).await.expect("memory store")).into_response()
        }
        "DELETE" => Json(store.delete(table, &filter).await.expect("memory store")).into_response(),
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// Referential checks the real backend enforces with foreign keys
async fn foreign_key_violation(
    store: &MemoryStore,
    table: Table,
    row: &serde_json::Map<String, Value>,
) -> Option<String> {
    let (column, parent) = match table {
        Table::Threads => ("forum_id", Table::Forums),
        Table::Posts => ("thread_id", Table::Threads),
        _ => return None,
    };
    let id = row.get(column).cloned().unwrap_or(Value::Null);
    let parents = store
        .select(parent, &Filter::new().eq("id", id))
        .await
        .expect("memory store");
    if parents.is_empty() {
        Some(format!(
            "insert or update on table \"{}\" violates foreign key constraint on \"{}\"",
            table, column
        ))
    } else {
        None
    }
}

// --- Spawned server ---------------------------------------------------------

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    /// Run the built binary against the backend at `store_addr`
    pub async fn spawn(store_addr: SocketAddr) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_shopforum-api"))
            .env("SUPABASE_URL", format!("http://{}", store_addr))
            .env("SUPABASE_KEY", STORE_KEY)
            .env("API_HOST", "127.0.0.1")
            .env("PORT", port.to_string())
            .env("RUST_LOG", "warn")
            .env_remove("APP_ENV")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        let server = Self { port, base_url, child };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
