//! HTTP server for discovery and rendering.

use axum::{
    extract::{Query, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use pgtopo::{MemoryStore, TopologyStore, Walker};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::render::{render, Format};

/// Header carrying the number of branches that could not be discovered.
pub const FAILURES_HEADER: &str = "x-discovery-failures";

/// Header naming the server that stopped a walk under the abort policy.
pub const ABORTED_HEADER: &str = "x-discovery-aborted";

/// Shared state for the HTTP server.
pub struct AppState {
    pub walker: Walker<MemoryStore>,
    /// Host walked when a request does not name one.
    pub default_host: String,
    /// Held for the duration of a walk so runs never interleave.
    run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(walker: Walker<MemoryStore>, default_host: impl Into<String>) -> Self {
        Self {
            walker,
            default_host: default_host.into(),
            run_lock: Mutex::new(()),
        }
    }
}

/// Query string accepted by `/data`.
#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    pub host: Option<String>,
    /// Output format: `json`, `dot` or `svg`.
    pub r: Option<String>,
}

/// Create the router. `static_dir`, when set, is served under `/static`.
pub fn create_router(state: Arc<AppState>, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/", get(serve_index))
        .route("/data", get(serve_data))
        .route("/health", get(health))
        .with_state(state);

    match static_dir {
        Some(dir) => router.nest_service("/static", ServeDir::new(dir)),
        None => router,
    }
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

async fn health() -> &'static str {
    "ok"
}

async fn serve_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DataQuery>,
) -> Response {
    let host = query
        .host
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| state.default_host.clone());
    let format = Format::from_param(query.r.as_deref());

    // Rendered under the same guard so the body reflects exactly this walk.
    let (result, body) = {
        let _guard = state.run_lock.lock().await;
        let result = state.walker.walk(&host).await;
        (result, render(format, &state.walker.store().all()))
    };

    let (failures, aborted_at) = match result {
        Ok(report) => (report.failures.len(), None),
        Err(e) => {
            error!(host = %host, error = %e, "Discovery aborted");
            (1, Some(e.address().to_string()))
        }
    };

    if failures > 0 && aborted_at.is_none() {
        warn!(host = %host, failures, "Discovery finished with unreachable branches");
    }

    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (HeaderName::from_static(FAILURES_HEADER), failures.to_string()),
        ],
        body,
    )
        .into_response();

    if let Some(address) = aborted_at {
        if let Ok(value) = HeaderValue::from_str(&address) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(ABORTED_HEADER), value);
        }
    }

    response
}

/// Start the server and run until it fails.
pub async fn run_server(
    state: Arc<AppState>,
    addr: SocketAddr,
    static_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let app = create_router(state, static_dir);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app).await?;
    Ok(())
}
