//! Todo enhancement endpoint.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use todo_ai_common::{Capability, EnhanceRequest, EnhanceResponse};

use crate::error::{Error, Result};
use crate::state::AppState;

/// Build the todo router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/ai/todo/enhance", post(enhance_todo))
}

/// POST /api/ai/todo/enhance - Suggestions, a breakdown, or an analysis of a todo item.
async fn enhance_todo(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<EnhanceRequest>, JsonRejection>,
) -> Result<Json<EnhanceResponse>> {
    let Json(request) = body?;
    let generator = state
        .registry
        .generator(Capability::TextGenerator)
        .ok_or_else(|| Error::CapabilityUnavailable("AI enhancement not available".to_string()))?;

    let prompt = request.enhancement_type.prompt(&request.text);
    let enhancement = state
        .dispatcher
        .run(Capability::TextGenerator, async move {
            generator.generate(&prompt).await
        })
        .await?;

    Ok(Json(EnhanceResponse {
        original: request.text,
        enhancement,
        enhancement_type: request.enhancement_type,
    }))
}
