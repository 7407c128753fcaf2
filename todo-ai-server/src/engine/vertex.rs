//! Vertex AI hosted generative model.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::TextGenerator;
use crate::config::HostedConfig;
use crate::error::{Error, Result};

/// Generates text through the Vertex AI `generateContent` REST endpoint.
pub struct VertexGenerator {
    http_client: Client,
    url: String,
    access_token: Option<String>,
}

impl VertexGenerator {
    pub fn new(http_client: Client, project: &str, config: &HostedConfig) -> Self {
        let url = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            config.endpoint(),
            project,
            config.location,
            config.model
        );

        Self {
            http_client,
            url,
            access_token: config.access_token.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

// ============================================================================
// Vertex AI API types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Result<String> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(Error::InvocationFailed(match block_reason {
                Some(reason) => format!("prompt blocked: {}", reason),
                None => "response contained no candidates".to_string(),
            }));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::InvocationFailed(format!(
                "candidate contained no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

// ============================================================================
// TextGenerator implementation
// ============================================================================

#[async_trait]
impl TextGenerator for VertexGenerator {
    fn backend_type(&self) -> &'static str {
        "vertex_ai"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!("Sending request to Vertex AI: {}", self.url);

        let mut builder = self.http_client.post(&self.url).json(&request);
        if let Some(ref token) = self.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::InvocationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InvocationFailed(format!(
                "Vertex AI returned {}: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::InvocationFailed(format!("invalid response: {}", e)))?;

        body.into_text()
    }
}
