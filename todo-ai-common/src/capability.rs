//! Capability types for the AI server.

use serde::{Deserialize, Serialize};

/// Logical capabilities that the server can provide.
///
/// These are named, independently loadable model units. A request names
/// the capability it wants; the server checks whether it was acquired at
/// startup before dispatching any work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Hosted generative-text model
    TextGenerator,
    /// Local sentiment-analysis pipeline
    Sentiment,
    /// Local text-classification pipeline
    TextClassification,
}

impl Capability {
    /// All capability variants for iteration.
    pub const ALL: [Capability; 3] = [
        Capability::TextGenerator,
        Capability::Sentiment,
        Capability::TextClassification,
    ];

    /// Local pipelines, loaded with accelerated/fallback acquisition.
    pub const PIPELINES: [Capability; 2] = [Capability::Sentiment, Capability::TextClassification];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::TextGenerator => "text_generator",
            Capability::Sentiment => "sentiment",
            Capability::TextClassification => "text_classification",
        }
    }

    /// Whether this capability is backed by a remote managed service.
    pub fn is_hosted(&self) -> bool {
        matches!(self, Capability::TextGenerator)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a model handle was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccelerationMode {
    /// Acquired on an accelerator device
    Accelerated,
    /// Acquired without hardware acceleration (fallback, or a hosted model)
    Unaccelerated,
}

/// Startup outcome for a capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ModelStatus {
    /// Handle acquired and ready for inference
    Loaded { mode: AccelerationMode },
    /// No configuration for this capability; it was never attempted
    NotConfigured,
    /// Every acquisition attempt failed
    Failed {
        /// Error message from the last attempt
        message: String,
    },
}

impl ModelStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelStatus::Loaded { .. })
    }
}
