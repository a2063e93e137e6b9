//! HTTP server for the JSON-RPC endpoint.

use crate::router::process_request;
use crate::state::{ApiState, RequestContext};
use axum::extract::{ConnectInfo, DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

const MAX_BODY_BYTES: usize = 256 * 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Serve the endpoint until the quit channel fires.
pub async fn serve(
    bind_addr: SocketAddr,
    state: ApiState,
    mut quit: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "rpc endpoint listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = quit.changed().await;
        info!("rpc endpoint stopping on shutdown signal");
    })
    .await
}

pub fn build_router(state: ApiState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    Router::new()
        .route("/", post(handle_rpc))
        .route("/rpc", post(handle_rpc))
        .fallback(fallback)
        .layer(middleware)
        .with_state(state)
}

async fn handle_rpc(
    State(state): State<ApiState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let ctx = RequestContext {
        api_token: headers
            .get("X-Api-Token")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        remote_addr: remote.to_string(),
    };
    let response = process_request(&state, &ctx, &body).await;
    (StatusCode::OK, Json(response))
}

/// Anything that is not a JSON-RPC POST gets a JSON-RPC flavored 405.
async fn fallback() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({
            "error": { "code": -32601, "message": "method not found" }
        })),
    )
}
