//! Production model loader.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use todo_ai_common::Capability;

use super::{Device, ModelLoader, TeiPipeline, TextGenerator, TextPipeline, VertexGenerator};
use crate::config::{HostedConfig, PipelineConfig};
use crate::error::{Error, Result};

/// Loads the Vertex AI generator and TEI-served pipelines over HTTP.
///
/// A pipeline's accelerated and fallback modes are separate servers;
/// `device` selects which endpoint is contacted.
pub struct HttpModelLoader {
    http_client: Client,
}

impl HttpModelLoader {
    /// Loader whose backends give up on any HTTP request after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }
}

#[async_trait]
impl ModelLoader for HttpModelLoader {
    async fn load_generator(
        &self,
        project: &str,
        config: &HostedConfig,
    ) -> Result<Arc<dyn TextGenerator>> {
        if config.access_token.is_none() {
            tracing::warn!("No access token configured for Vertex AI; requests will be unauthenticated");
        }
        Ok(Arc::new(VertexGenerator::new(
            self.http_client.clone(),
            project,
            config,
        )))
    }

    async fn load_pipeline(
        &self,
        capability: Capability,
        config: &PipelineConfig,
        device: Device,
    ) -> Result<Arc<dyn TextPipeline>> {
        let url = match device {
            Device::Accelerated { .. } => config.accelerated_url.as_deref(),
            Device::Cpu => config.fallback_url.as_deref(),
        };

        let url = url.ok_or_else(|| {
            Error::LoadFailed(format!("no {} endpoint configured for {}", device, capability))
        })?;

        let pipeline =
            TeiPipeline::connect(self.http_client.clone(), url, config.model.as_deref()).await?;

        tracing::debug!(
            "Connected {} pipeline to {} ({}) on {}",
            capability,
            url,
            pipeline.model_id(),
            device
        );

        Ok(Arc::new(pipeline))
    }
}
