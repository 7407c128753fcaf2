//! Integration tests for the AI server HTTP API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use todo_ai_common::{
    AccelerationMode, Capability, CapabilitySnapshot, DeviceInfo, DeviceMemory, Prediction,
};
use todo_ai_server::config::HostedConfig;
use todo_ai_server::{
    app, AppState, Config, Error, HttpModelLoader, ModelHandle, ModelRegistry, Result,
    TextGenerator, TextPipeline,
};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Test backends
// ============================================================================

#[derive(Default)]
struct EchoGenerator {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    fn backend_type(&self) -> &'static str {
        "echo"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("generated: {}", prompt))
    }
}

struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    fn backend_type(&self) -> &'static str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(Error::InvocationFailed("backend exploded".to_string()))
    }
}

struct FixedPipeline {
    label: &'static str,
    calls: AtomicUsize,
}

impl FixedPipeline {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextPipeline for FixedPipeline {
    fn backend_type(&self) -> &'static str {
        "fixed"
    }

    async fn classify(&self, _text: &str) -> Result<Vec<Prediction>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![
            Prediction {
                label: self.label.to_string(),
                score: 0.93,
            },
            Prediction {
                label: "other".to_string(),
                score: 0.07,
            },
        ])
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn gpu_snapshot() -> CapabilitySnapshot {
    CapabilitySnapshot::from_devices(vec![DeviceInfo {
        index: 0,
        name: "NVIDIA L4".to_string(),
        memory: DeviceMemory {
            total_bytes: 23034 * 1024 * 1024,
            reserved_bytes: 300 * 1024 * 1024,
            allocated_bytes: 1200 * 1024 * 1024,
        },
    }])
}

fn test_app(snapshot: CapabilitySnapshot, handles: Vec<ModelHandle>) -> Router {
    let registry = Arc::new(ModelRegistry::from_handles(handles));
    app(Arc::new(AppState::new(&Config::default(), snapshot, registry)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("Content-Type", "application/json");
    }

    let request = builder
        .body(match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// ============================================================================
// Summary and health
// ============================================================================

#[tokio::test]
async fn test_root_with_nothing_loaded() {
    let app = test_app(CapabilitySnapshot::unaccelerated(), vec![]);

    let (status, body) = send(&app, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["gpu_available"], false);
    assert_eq!(body["models_loaded"], json!([]));
    assert_eq!(body["pipelines_available"], json!([]));
}

#[tokio::test]
async fn test_root_lists_loaded_capabilities() {
    let app = test_app(
        gpu_snapshot(),
        vec![
            ModelHandle::generator(
                Capability::TextGenerator,
                AccelerationMode::Unaccelerated,
                Arc::new(EchoGenerator::default()),
            ),
            ModelHandle::pipeline(
                Capability::Sentiment,
                AccelerationMode::Accelerated,
                FixedPipeline::new("positive"),
            ),
        ],
    );

    let (_, body) = send(&app, Method::GET, "/", None).await;

    assert_eq!(body["gpu_available"], true);
    assert_eq!(body["models_loaded"], json!(["text_generator"]));
    assert_eq!(body["pipelines_available"], json!(["sentiment"]));
}

#[tokio::test]
async fn test_health_reports_snapshot() {
    let app = test_app(gpu_snapshot(), vec![]);

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["gpu_status"]["accelerated"], true);
    assert_eq!(body["gpu_status"]["device_names"], json!(["NVIDIA L4"]));
    assert!(body["timestamp"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_ai_health_counts_ready_models() {
    let app = test_app(
        CapabilitySnapshot::unaccelerated(),
        vec![ModelHandle::pipeline(
            Capability::TextClassification,
            AccelerationMode::Unaccelerated,
            FixedPipeline::new("LABEL_1"),
        )],
    );

    let (status, body) = send(&app, Method::GET, "/api/ai/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ai_services"], "operational");
    assert_eq!(body["gpu_acceleration"], false);
    assert_eq!(body["models_ready"], 1);
    assert_eq!(body["models"]["text_classification"]["status"], "loaded");
    assert_eq!(body["models"]["text_classification"]["mode"], "unaccelerated");
    assert_eq!(body["models"]["sentiment"]["status"], "not_configured");
}

// ============================================================================
// GPU info
// ============================================================================

#[tokio::test]
async fn test_gpu_info_without_gpu_is_not_found() {
    let app = test_app(CapabilitySnapshot::unaccelerated(), vec![]);

    let (status, body) = send(&app, Method::GET, "/api/ai/gpu/info", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "No GPU available");
}

#[tokio::test]
async fn test_gpu_info_with_gpu() {
    let app = test_app(gpu_snapshot(), vec![]);

    let (status, body) = send(&app, Method::GET, "/api/ai/gpu/info", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["device_count"].as_u64().unwrap() >= 1);
    assert_eq!(body["current_device"], 0);
    assert_eq!(body["device_name"], "NVIDIA L4");
    assert_eq!(body["memory_allocated"], 1200u64 * 1024 * 1024);
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn test_sentiment_with_loaded_pipeline() {
    let sentiment = FixedPipeline::new("positive");
    let app = test_app(
        gpu_snapshot(),
        vec![
            ModelHandle::pipeline(
                Capability::Sentiment,
                AccelerationMode::Accelerated,
                sentiment.clone(),
            ),
            ModelHandle::pipeline(
                Capability::TextClassification,
                AccelerationMode::Accelerated,
                FixedPipeline::new("LABEL_0"),
            ),
        ],
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/sentiment",
        Some(json!({"text": "great day"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentiment"]["label"], "positive");
    assert!(body["sentiment"]["score"].as_f64().unwrap() > 0.9);
    assert_eq!(sentiment.calls(), 1);

    let (status, body) = send(&app, Method::GET, "/api/ai/gpu/info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["device_count"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_sentiment_unavailable() {
    let app = test_app(CapabilitySnapshot::unaccelerated(), vec![]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/sentiment",
        Some(json!({"text": "great day"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "capability_unavailable");
    assert_eq!(body["error"]["message"], "Sentiment model not available");
}

#[tokio::test]
async fn test_generate_with_hosted_model() {
    let generator = Arc::new(EchoGenerator::default());
    let app = test_app(
        CapabilitySnapshot::unaccelerated(),
        vec![ModelHandle::generator(
            Capability::TextGenerator,
            AccelerationMode::Unaccelerated,
            generator.clone(),
        )],
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/generate",
        Some(json!({"prompt": "write a haiku"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "generated: write a haiku");
    assert_eq!(*generator.prompts.lock().unwrap(), vec!["write a haiku"]);
}

#[tokio::test]
async fn test_generate_with_local_pipeline() {
    let app = test_app(
        CapabilitySnapshot::unaccelerated(),
        vec![ModelHandle::pipeline(
            Capability::TextClassification,
            AccelerationMode::Unaccelerated,
            FixedPipeline::new("LABEL_1"),
        )],
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/generate",
        Some(json!({"prompt": "hello", "model": "local"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["label"], "LABEL_1");
}

#[tokio::test]
async fn test_generate_absent_capability_never_invokes() {
    let sentiment = FixedPipeline::new("positive");
    let app = test_app(
        CapabilitySnapshot::unaccelerated(),
        vec![ModelHandle::pipeline(
            Capability::Sentiment,
            AccelerationMode::Unaccelerated,
            sentiment.clone(),
        )],
    );

    for request in [
        json!({"prompt": "hello"}),
        json!({"prompt": "hello", "model": "local"}),
        json!({"prompt": "hello", "model": "gpt-4"}),
    ] {
        let (status, body) = send(&app, Method::POST, "/api/ai/generate", Some(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Model not available");
    }

    assert_eq!(sentiment.calls(), 0);
}

#[tokio::test]
async fn test_invocation_failure_is_contained() {
    let app = test_app(
        CapabilitySnapshot::unaccelerated(),
        vec![
            ModelHandle::generator(
                Capability::TextGenerator,
                AccelerationMode::Unaccelerated,
                Arc::new(FailingGenerator),
            ),
            ModelHandle::pipeline(
                Capability::Sentiment,
                AccelerationMode::Unaccelerated,
                FixedPipeline::new("negative"),
            ),
        ],
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/generate",
        Some(json!({"prompt": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["type"], "inference_failed");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/sentiment",
        Some(json!({"text": "still working?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentiment"]["label"], "negative");
}

// ============================================================================
// Todo enhancement
// ============================================================================

#[tokio::test]
async fn test_enhance_unavailable() {
    let app = test_app(CapabilitySnapshot::unaccelerated(), vec![]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/todo/enhance",
        Some(json!({"text": "buy milk"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "AI enhancement not available");
}

#[tokio::test]
async fn test_enhance_prompt_templates() {
    let generator = Arc::new(EchoGenerator::default());
    let app = test_app(
        CapabilitySnapshot::unaccelerated(),
        vec![ModelHandle::generator(
            Capability::TextGenerator,
            AccelerationMode::Unaccelerated,
            generator.clone(),
        )],
    );

    for (kind, expected) in [
        ("suggestions", "Suggest improvements for this todo item: 'walk dog'"),
        ("breakdown", "Break down this todo into smaller tasks: 'walk dog'"),
        ("priority", "Analyze this todo item: 'walk dog'"),
    ] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ai/todo/enhance",
            Some(json!({"text": "walk dog", "type": kind})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], kind);
        assert_eq!(body["enhancement"], format!("generated: {}", expected));
    }
}

#[tokio::test]
async fn test_enhance_null_or_non_string_type_gets_analysis() {
    let generator = Arc::new(EchoGenerator::default());
    let app = test_app(
        CapabilitySnapshot::unaccelerated(),
        vec![ModelHandle::generator(
            Capability::TextGenerator,
            AccelerationMode::Unaccelerated,
            generator.clone(),
        )],
    );

    for kind in [Value::Null, json!(5), json!(["breakdown"])] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ai/todo/enhance",
            Some(json!({"text": "walk dog", "type": kind.clone()})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], kind);
        assert_eq!(
            body["enhancement"],
            "generated: Analyze this todo item: 'walk dog'"
        );
    }
}

#[tokio::test]
async fn test_malformed_body_uses_error_shape() {
    let sentiment = FixedPipeline::new("positive");
    let app = test_app(
        CapabilitySnapshot::unaccelerated(),
        vec![ModelHandle::pipeline(
            Capability::Sentiment,
            AccelerationMode::Unaccelerated,
            sentiment.clone(),
        )],
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/sentiment",
        Some(json!({"text": 5})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["type"], "invalid_request");
    assert!(body["error"]["message"].as_str().unwrap().len() > 0);
    assert_eq!(sentiment.calls(), 0);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/ai/todo/enhance")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["type"], "invalid_request");
}

#[tokio::test]
async fn test_enhance_through_hosted_model() {
    let vertex = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(
            r"^/v1/projects/todo-project/locations/us-central1/publishers/google/models/gemini-pro:generateContent$",
        ))
        .and(body_string_contains(
            "Break down this todo into smaller tasks: 'buy milk'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "1. Go to the store\n2. Buy milk"}]},
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&vertex)
        .await;

    let config = Config {
        hosted: HostedConfig {
            project: Some("todo-project".to_string()),
            endpoint: Some(vertex.uri()),
            access_token: Some("token".to_string()),
            ..HostedConfig::default()
        },
        ..Config::default()
    };

    let snapshot = CapabilitySnapshot::unaccelerated();
    let registry = ModelRegistry::build(&snapshot, &config, &HttpModelLoader::new(Duration::from_secs(5))).await;
    assert!(registry.contains(Capability::TextGenerator));

    let app = app(Arc::new(AppState::new(&config, snapshot, Arc::new(registry))));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/todo/enhance",
        Some(json!({"text": "buy milk", "type": "breakdown"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["original"], "buy milk");
    assert_eq!(body["type"], "breakdown");
    assert_eq!(body["enhancement"], "1. Go to the store\n2. Buy milk");
}

#[tokio::test]
async fn test_build_without_configuration_serves_empty_registry() {
    let snapshot = CapabilitySnapshot::unaccelerated();
    let config = Config::default();
    let registry = ModelRegistry::build(&snapshot, &config, &HttpModelLoader::new(Duration::from_secs(5))).await;
    assert!(registry.is_empty());

    let app = app(Arc::new(AppState::new(&config, snapshot, Arc::new(registry))));
    let (_, body) = send(&app, Method::GET, "/", None).await;

    assert_eq!(body["models_loaded"], json!([]));
    assert_eq!(body["pipelines_available"], json!([]));
}
