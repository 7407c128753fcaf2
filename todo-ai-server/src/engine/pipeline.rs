//! Local classification pipeline served by a text-embeddings-inference server.
//!
//! One server runs per acceleration mode; the registry picks which one to
//! connect to. Connecting checks `/info` so a pipeline whose server is down
//! or serving a non-classifier model fails acquisition instead of failing
//! every request later.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use todo_ai_common::Prediction;

use super::TextPipeline;
use crate::error::{Error, Result};

/// Pipeline backed by the `/predict` endpoint of a TEI server.
pub struct TeiPipeline {
    http_client: Client,
    base_url: String,
    model_id: String,
}

// ============================================================================
// TEI API types
// ============================================================================

/// Response from /info endpoint.
#[derive(Debug, Deserialize)]
struct TeiInfo {
    model_id: String,
    #[serde(default)]
    model_type: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct TeiPrediction {
    label: String,
    score: f32,
}

#[derive(Debug, Deserialize)]
struct TeiError {
    error: String,
}

impl TeiPipeline {
    /// Connect to the server at `base_url`, checking it serves a classifier.
    ///
    /// `expected_model` is compared against the model the server reports;
    /// a mismatch is logged, not rejected.
    pub async fn connect(
        http_client: Client,
        base_url: &str,
        expected_model: Option<&str>,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let url = format!("{}/info", base_url);

        let response = http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Communication(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::LoadFailed(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let info: TeiInfo = response
            .json()
            .await
            .map_err(|e| Error::Communication(e.to_string()))?;

        if let Some(ref model_type) = info.model_type {
            if model_type.get("classifier").is_none() {
                return Err(Error::LoadFailed(format!(
                    "{} serves {} which is not a classification model",
                    base_url, info.model_id
                )));
            }
        }

        if let Some(expected) = expected_model {
            if expected != info.model_id {
                tracing::warn!(
                    "Pipeline server {} serves {} (configured: {})",
                    base_url,
                    info.model_id,
                    expected
                );
            }
        }

        Ok(Self {
            http_client,
            base_url,
            model_id: info.model_id,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// TextPipeline implementation
// ============================================================================

#[async_trait]
impl TextPipeline for TeiPipeline {
    fn backend_type(&self) -> &'static str {
        "tei"
    }

    async fn classify(&self, text: &str) -> Result<Vec<Prediction>> {
        let url = format!("{}/predict", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .json(&PredictRequest { inputs: text })
            .send()
            .await
            .map_err(|e| Error::InvocationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TeiError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(Error::InvocationFailed(format!(
                "{} returned {}: {}",
                self.model_id, status, message
            )));
        }

        let mut predictions: Vec<TeiPrediction> = response
            .json()
            .await
            .map_err(|e| Error::InvocationFailed(format!("invalid response: {}", e)))?;

        predictions.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(predictions
            .into_iter()
            .map(|p| Prediction {
                label: p.label,
                score: p.score,
            })
            .collect())
    }
}
