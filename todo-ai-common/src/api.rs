//! Request and response bodies of the HTTP API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Capability, CapabilitySnapshot, ModelStatus};

/// One label produced by a classification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f32,
}

/// Which backend `POST /api/ai/generate` should use.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateModel {
    /// Hosted generative model
    #[default]
    VertexAi,
    /// Local classification pipeline
    Local,
    /// Anything else; always answered with "model not available"
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub model: GenerateModel,
}

/// Body of a generate response. Hosted models answer with text, local
/// pipelines with their top prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerateOutput {
    Text(String),
    Prediction(Prediction),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: GenerateOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub sentiment: Prediction,
}

/// Kind of todo enhancement. Unknown kinds get a generic analysis prompt.
///
/// Whatever the client sent is echoed back in the response, including
/// `null` and non-string values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementType {
    #[default]
    Suggestions,
    Breakdown,
    #[serde(untagged)]
    Other(String),
    #[serde(untagged)]
    Unrecognized(serde_json::Value),
}

impl EnhancementType {
    /// Build the prompt sent to the generative model.
    pub fn prompt(&self, todo_text: &str) -> String {
        match self {
            EnhancementType::Suggestions => {
                format!("Suggest improvements for this todo item: '{}'", todo_text)
            }
            EnhancementType::Breakdown => {
                format!("Break down this todo into smaller tasks: '{}'", todo_text)
            }
            EnhancementType::Other(_) | EnhancementType::Unrecognized(_) => {
                format!("Analyze this todo item: '{}'", todo_text)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhanceRequest {
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub enhancement_type: EnhancementType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhanceResponse {
    pub original: String,
    pub enhancement: String,
    #[serde(rename = "type")]
    pub enhancement_type: EnhancementType,
}

/// `GET /` service summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub service: String,
    pub status: String,
    pub gpu_available: bool,
    pub models_loaded: Vec<Capability>,
    pub pipelines_available: Vec<Capability>,
}

/// `GET /health` liveness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub gpu_status: CapabilitySnapshot,
    /// Unix time in seconds.
    pub timestamp: f64,
}

/// `GET /api/ai/health` capability summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiHealthResponse {
    pub ai_services: String,
    pub gpu_acceleration: bool,
    pub models_ready: usize,
    pub models: BTreeMap<Capability, ModelStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuDevice {
    pub index: u32,
    pub name: String,
    pub total_bytes: u64,
    pub reserved_bytes: u64,
    pub allocated_bytes: u64,
}

/// `GET /api/ai/gpu/info` detail report. Top-level memory figures describe
/// the current device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuInfoResponse {
    pub device_count: usize,
    pub current_device: u32,
    pub device_name: String,
    pub memory_allocated: u64,
    pub memory_reserved: u64,
    pub devices: Vec<GpuDevice>,
}
