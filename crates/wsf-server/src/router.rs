//! Router configuration.
//!
//! This module creates the main Axum router that combines all endpoints.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use wsf_protocol::endpoints::wsfed_router;
use wsf_protocol::WSFED_ENDPOINT_PATH;

use crate::state::AppState;
use crate::ui;

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let wsfed = wsfed_router().with_state(state.wsfed_state());

    let health = Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check))
        .with_state(state.clone());

    let ui_routes = Router::new()
        .route(&state.config.login_path, get(ui::login_page).post(ui::login_submit))
        .with_state(state.clone());

    Router::new()
        .merge(wsfed)
        .merge(health)
        .merge(ui_routes)
        .route("/", get(root))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse().ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Root endpoint handler.
async fn root() -> Json<ServerInfo> {
    Json(ServerInfo {
        name: "WS-Federation Bridge".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoint: WSFED_ENDPOINT_PATH.to_string(),
    })
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

/// Server information response.
#[derive(Serialize)]
pub struct ServerInfo {
    name: String,
    version: String,
    endpoint: String,
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    })
}

/// Kubernetes liveness probe.
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe: ready once a signing key is installed.
async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    if state.providers.keys.snapshot().is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
