//! Text generation and sentiment endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use todo_ai_common::{
    Capability, GenerateModel, GenerateOutput, GenerateRequest, GenerateResponse, Prediction,
    SentimentRequest, SentimentResponse,
};

use crate::error::{Error, Result};
use crate::state::AppState;

/// Build the inference router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ai/generate", post(generate))
        .route("/api/ai/sentiment", post(sentiment))
}

fn model_unavailable() -> Error {
    Error::CapabilityUnavailable("Model not available".to_string())
}

/// POST /api/ai/generate - Hosted generation, or local classification.
async fn generate(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>> {
    let Json(request) = body?;
    let response = match request.model {
        GenerateModel::VertexAi => {
            let generator = state
                .registry
                .generator(Capability::TextGenerator)
                .ok_or_else(model_unavailable)?;

            let prompt = request.prompt;
            let text = state
                .dispatcher
                .run(Capability::TextGenerator, async move {
                    generator.generate(&prompt).await
                })
                .await?;

            GenerateOutput::Text(text)
        }
        GenerateModel::Local => {
            let pipeline = state
                .registry
                .pipeline(Capability::TextClassification)
                .ok_or_else(model_unavailable)?;

            let prompt = request.prompt;
            let predictions = state
                .dispatcher
                .run(Capability::TextClassification, async move {
                    pipeline.classify(&prompt).await
                })
                .await?;

            GenerateOutput::Prediction(top_prediction(predictions)?)
        }
        GenerateModel::Other(ref model) => {
            tracing::debug!("Generate request for unknown model: {}", model);
            return Err(model_unavailable());
        }
    };

    Ok(Json(GenerateResponse { response }))
}

/// POST /api/ai/sentiment - Sentiment of a piece of text.
async fn sentiment(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<SentimentRequest>, JsonRejection>,
) -> Result<Json<SentimentResponse>> {
    let Json(request) = body?;
    let pipeline = state
        .registry
        .pipeline(Capability::Sentiment)
        .ok_or_else(|| Error::CapabilityUnavailable("Sentiment model not available".to_string()))?;

    let text = request.text;
    let predictions = state
        .dispatcher
        .run(Capability::Sentiment, async move { pipeline.classify(&text).await })
        .await?;

    Ok(Json(SentimentResponse {
        sentiment: top_prediction(predictions)?,
    }))
}

fn top_prediction(predictions: Vec<Prediction>) -> Result<Prediction> {
    predictions
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvocationFailed("pipeline returned no predictions".to_string()))
}
