//! Service summary and health endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use todo_ai_common::{AiHealthResponse, HealthResponse, ServiceSummary};

use crate::state::AppState;

const SERVICE_NAME: &str = "AI GPU Development Server";

/// Build the health router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/ai/health", get(ai_health))
}

/// GET / - What the server is running with.
async fn root(State(state): State<Arc<AppState>>) -> Json<ServiceSummary> {
    Json(ServiceSummary {
        service: SERVICE_NAME.to_string(),
        status: "running".to_string(),
        gpu_available: state.snapshot.accelerated(),
        models_loaded: state.registry.hosted_models(),
        pipelines_available: state.registry.local_pipelines(),
    })
}

/// GET /health - Liveness, with the GPU snapshot.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let now = chrono::Utc::now();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        gpu_status: state.snapshot.clone(),
        timestamp: now.timestamp_millis() as f64 / 1000.0,
    })
}

/// GET /api/ai/health - How many models are ready, and why the others are not.
async fn ai_health(State(state): State<Arc<AppState>>) -> Json<AiHealthResponse> {
    Json(AiHealthResponse {
        ai_services: "operational".to_string(),
        gpu_acceleration: state.snapshot.accelerated(),
        models_ready: state.registry.len(),
        models: state.registry.statuses().clone(),
    })
}
