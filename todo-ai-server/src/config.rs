//! Configuration for the AI server.

use std::env;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use todo_ai_common::Capability;

/// Environment variable that enables the hosted generative model.
pub const HOSTED_PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";

/// Main configuration structure for the AI server.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub gpu: GpuConfig,
    #[serde(default)]
    pub hosted: HostedConfig,
    #[serde(default)]
    pub pipelines: PipelinesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on a single model invocation.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Maximum number of model invocations running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_invocations: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_concurrent_invocations: default_max_concurrent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Accelerator probing.
#[derive(Debug, Clone, Deserialize)]
pub struct GpuConfig {
    /// Set to false to run as if no accelerator were present.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Path to the nvidia-smi binary.
    #[serde(default = "default_smi_binary")]
    pub smi_binary: String,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smi_binary: default_smi_binary(),
        }
    }
}

/// Hosted generative model (Vertex AI).
///
/// The model is only loaded when `project` is set.
#[derive(Debug, Clone, Deserialize)]
pub struct HostedConfig {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_hosted_model")]
    pub model: String,
    /// OAuth2 bearer token sent with every request.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Overrides the regional API endpoint (e.g. "https://us-central1-aiplatform.googleapis.com").
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            project: None,
            location: default_location(),
            model: default_hosted_model(),
            access_token: None,
            endpoint: None,
        }
    }
}

impl HostedConfig {
    /// The configured project, ignoring blank values.
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        }
    }
}

/// Local classification pipelines. A pipeline without a section is never loaded.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PipelinesConfig {
    #[serde(default)]
    pub sentiment: Option<PipelineConfig>,
    #[serde(default)]
    pub text_classification: Option<PipelineConfig>,
}

impl PipelinesConfig {
    pub fn get(&self, capability: Capability) -> Option<&PipelineConfig> {
        match capability {
            Capability::Sentiment => self.sentiment.as_ref(),
            Capability::TextClassification => self.text_classification.as_ref(),
            Capability::TextGenerator => None,
        }
    }
}

/// A local pipeline served by a text-classification inference server.
///
/// Each acceleration mode has its own endpoint: one server started on the
/// accelerator, one on the CPU.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Expected model id. A server reporting a different model is still used,
    /// with a warning.
    #[serde(default)]
    pub model: Option<String>,
    /// Accelerator ordinal requested in accelerated mode.
    #[serde(default)]
    pub device: u32,
    /// Server running the pipeline on the accelerator.
    #[serde(default)]
    pub accelerated_url: Option<String>,
    /// Server running the pipeline on the CPU.
    #[serde(default)]
    pub fallback_url: Option<String>,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3001
}
fn default_request_timeout() -> u64 {
    60
}
fn default_max_concurrent() -> usize {
    4
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_smi_binary() -> String {
    "nvidia-smi".to_string()
}
fn default_location() -> String {
    "us-central1".to_string()
}
fn default_hosted_model() -> String {
    "gemini-pro".to_string()
}

impl Config {
    /// Load configuration from `config.toml` and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. `GOOGLE_CLOUD_PROJECT` (sets `hosted.project`)
    /// 2. Environment variables (AI_SERVER__SECTION__KEY format)
    /// 3. config.toml file (if present)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration using `file` as the config file base name.
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            // Set defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("logging.level", default_log_level())?
            // Load from config file if exists
            .add_source(File::with_name(file).required(false))
            // Override with environment variables (AI_SERVER__SECTION__KEY format)
            .add_source(
                Environment::with_prefix("AI_SERVER")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("hosted.project", env::var(HOSTED_PROJECT_ENV).ok())?
            .build()?;

        config.try_deserialize()
    }
}
