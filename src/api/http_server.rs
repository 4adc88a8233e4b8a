// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server wiring
//!
//! Single detection endpoint plus health and model-availability probes.
//! CORS is wide open: the reference UI is served from another origin.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::detect::detect_handler;
use crate::config::Config;
use crate::detector::DetectorRegistry;
use crate::vision::Annotator;

/// Uploads above the decode cap get rejected during validation; the body
/// limit just has to let them through to that check.
const BODY_LIMIT_BYTES: usize = 12 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DetectorRegistry>,
    pub annotator: Arc<Annotator>,
}

/// One back end in the GET /models listing.
#[derive(Debug, Clone, Serialize)]
pub struct ModelEntry {
    pub name: &'static str,
    pub loaded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelEntry>,
}

/// Assemble the router. Shared between `start_server` and the integration
/// tests, which drive it directly with `tower::ServiceExt::oneshot`.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/detect", post(detect_handler))
        .route("/health", get(health_handler))
        .route("/models", get(models_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn start_server(config: &Config, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state, config.request_timeout);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("InstaDetect API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /models - supported back ends and whether each is loaded yet.
///
/// Replaces the original's per-request import probing: capability is
/// reported here instead of discovered by exception inside /detect.
async fn models_handler(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = state
        .registry
        .kinds()
        .into_iter()
        .map(|kind| ModelEntry {
            name: kind.as_str(),
            loaded: state.registry.is_loaded(kind),
        })
        .collect();
    Json(ModelsResponse { models })
}
