//! Model backends and the registry that owns them.
//!
//! This module defines the traits that abstract the hosted generative model
//! and the local classification pipelines, and the `ModelLoader` seam the
//! registry uses to acquire them at startup.

mod loader;
mod pipeline;
mod registry;
mod vertex;

pub use loader::HttpModelLoader;
pub use pipeline::TeiPipeline;
pub use registry::{ModelHandle, ModelRegistry};
pub use vertex::VertexGenerator;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use todo_ai_common::{AccelerationMode, Capability, Prediction};

use crate::config::{HostedConfig, PipelineConfig};
use crate::error::Result;

/// Device requested for a pipeline acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// Accelerator with the given ordinal
    Accelerated { ordinal: u32 },
    Cpu,
}

impl Device {
    pub fn mode(&self) -> AccelerationMode {
        match self {
            Device::Accelerated { .. } => AccelerationMode::Accelerated,
            Device::Cpu => AccelerationMode::Unaccelerated,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Accelerated { ordinal } => write!(f, "cuda:{}", ordinal),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

/// A generative text model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend identifier for logs (e.g. "vertex_ai").
    fn backend_type(&self) -> &'static str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// A text classification pipeline (sentiment analysis, text classification).
#[async_trait]
pub trait TextPipeline: Send + Sync {
    /// Backend identifier for logs (e.g. "tei").
    fn backend_type(&self) -> &'static str;

    /// Classify `text`. Predictions are ordered by descending score.
    async fn classify(&self, text: &str) -> Result<Vec<Prediction>>;
}

/// Acquires model handles during registry construction.
///
/// Each call is one acquisition attempt; the registry decides what to
/// retry.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Acquire the hosted generative model for `project`.
    async fn load_generator(
        &self,
        project: &str,
        config: &HostedConfig,
    ) -> Result<Arc<dyn TextGenerator>>;

    /// Acquire a local pipeline on `device`.
    async fn load_pipeline(
        &self,
        capability: Capability,
        config: &PipelineConfig,
        device: Device,
    ) -> Result<Arc<dyn TextPipeline>>;
}
