//! Liveness endpoint. Independent of the bot: it answers as soon as the
//! process is up.

use std::{net::SocketAddr, time::Instant};

use {
    axum::{Json, Router, extract::State, response::IntoResponse, routing::get},
    tokio_util::sync::CancellationToken,
    tracing::info,
};

#[derive(Clone)]
struct HealthState {
    started: Instant,
}

pub fn build_health_app() -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(HealthState {
            started: Instant::now(),
        })
}

async fn root_handler() -> &'static str {
    "Bot running"
}

async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started.elapsed().as_secs(),
    }))
}

/// Bind and serve until `cancel` fires.
pub async fn serve(addr: SocketAddr, cancel: CancellationToken) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "liveness endpoint listening");
    axum::serve(listener, build_health_app())
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}
