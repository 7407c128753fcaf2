//! Todo AI server - probes accelerator capability at startup, loads the
//! hosted and local models it can, and serves them over a small REST API.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod logging;
pub mod probe;
pub mod state;

pub use config::Config;
pub use dispatch::Dispatcher;
pub use engine::{HttpModelLoader, ModelHandle, ModelLoader, ModelRegistry, TextGenerator, TextPipeline};
pub use error::{Error, Result};
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application with all routes and middleware.
pub fn app(state: Arc<AppState>) -> Router {
    api::router()
        .layer(axum::middleware::from_fn(logging::request_logger))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
