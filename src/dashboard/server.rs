use axum::{
    routing::get,
    Router,
    response::IntoResponse,
    extract::State,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;

use crate::error::{Error, Result};
use crate::RidesEngine;

pub fn router(engine: RidesEngine) -> Router {
    Router::new()
        .route("/api/health", get(get_health))
        .route("/api/status", get(get_status))
        .layer(CompressionLayer::new())
        .with_state(engine)
}

pub async fn start_status_server(
    engine: RidesEngine,
    host: &str,
    port: u16,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Init(format!("failed to bind status port {}: {}", addr, e)))?;

    tracing::info!("Status API available at http://{}/api/status", addr);

    axum::serve(listener, router(engine))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| Error::Task(format!("status server failed: {}", e)))
}

async fn get_health() -> impl IntoResponse {
    axum::Json(json!({ "status": "ok" }))
}

async fn get_status(State(engine): State<RidesEngine>) -> impl IntoResponse {
    let snapshot = engine.get_snapshot().await;
    axum::Json(snapshot)
}
