//! HTTP API.

pub mod gpu;
pub mod health;
pub mod inference;
pub mod todo;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Build the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::router())
        .merge(gpu::router())
        .merge(inference::router())
        .merge(todo::router())
}
