//! Stand-in for an Ollama-style inference server.
//!
//! `POST /api/chat` answers immediately. The prefixed routes add latency, force
//! a status code or cap throughput so load tests can exercise every outcome.
use axum::{
    debug_handler,
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use lazy_static::lazy_static;
#[allow(unused)]
use metrics::{counter, gauge, histogram};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

pub fn router() -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/api/chat", post(chat))
        .route("/delay/ms/:delay_ms/api/chat", post(delayed_chat))
        .route("/status/:code/api/chat", post(status_chat))
        .route("/max/:max_rps/server/:server_id/api/chat", post(limited_chat))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind {addr}: {err}");
            return;
        }
    };
    serve(listener).await;
}

/// Serve on an ephemeral localhost port and return its address.
pub async fn spawn() -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(serve(listener));
    Ok(addr)
}

async fn serve(listener: tokio::net::TcpListener) {
    if let Ok(addr) = listener.local_addr() {
        info!("Mock inference server listening on {addr}");
    }
    if let Err(err) = axum::serve(listener, router()).await {
        error!("Mock inference server stopped: {err}");
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub messages: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub model: String,
    pub message: Value,
    pub done: bool,
}

async fn liveness() -> &'static str {
    "Ollama is running"
}

#[debug_handler]
pub async fn chat(Json(req): Json<ChatRequest>) -> Json<ChatResponse> {
    REQUESTS.fetch_add(1, Ordering::Relaxed);
    counter!("mock-server.requests", "model" => req.model.clone()).increment(1);
    debug!("Chat for {} with {} messages", req.model, req.messages.len());

    Json(ChatResponse {
        model: req.model,
        message: json!({"role": "assistant", "content": "Because of Rayleigh scattering."}),
        done: true,
    })
}

#[debug_handler]
pub async fn delayed_chat(
    Path(delay_ms): Path<u64>,
    body: Json<ChatRequest>,
) -> Json<ChatResponse> {
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    chat(body).await
}

#[debug_handler]
pub async fn status_chat(
    Path(code): Path<u16>,
    body: Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    if status.is_success() {
        Ok(chat(body).await)
    } else {
        REQUESTS.fetch_add(1, Ordering::Relaxed);
        Err(status)
    }
}

lazy_static! {
    static ref LIMITED_MAP: Arc<RwLock<HashMap<String, Arc<DefaultDirectRateLimiter>>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

/// Answers 503 once `server_id` is over `max_rps`, like an overloaded model server.
#[debug_handler]
pub async fn limited_chat(
    Path((max_rps, server_id)): Path<(u32, String)>,
    body: Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    let max_rps = NonZeroU32::new(max_rps).ok_or(StatusCode::BAD_REQUEST)?;

    let read = LIMITED_MAP
        .read()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .get(&server_id)
        .cloned();
    let limiter = match read {
        Some(limiter) => limiter,
        None => {
            let limiter = Arc::new(RateLimiter::direct(Quota::per_second(max_rps)));
            LIMITED_MAP
                .write()
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
                .entry(server_id)
                .or_insert(limiter)
                .clone()
        }
    };

    if limiter.check().is_ok() {
        Ok(chat(body).await)
    } else {
        REQUESTS.fetch_add(1, Ordering::Relaxed);
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/** Request rate printer **/

static REQUESTS: AtomicU64 = AtomicU64::new(0);

pub async fn rps_measure_task() {
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let requests = REQUESTS.swap(0, Ordering::Relaxed);
        histogram!("mock-server.rps").record(requests as f64);
        info!("{requests} requests/s");
    }
}
