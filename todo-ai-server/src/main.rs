//! Todo AI server binary.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use todo_ai_common::CapabilitySnapshot;

use todo_ai_server::{app, logging, probe, AppState, Config, HttpModelLoader, ModelRegistry};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    println!("todo-ai-server {}", VERSION);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        print_version();
        return Ok(());
    }

    // Load configuration
    let config = Config::load().map_err(|e| format!("Failed to load configuration: {}", e))?;

    logging::init(&config.logging.level);
    tracing::info!("Starting AI GPU Development Server {}", VERSION);

    // Probe accelerators
    let gpu_config = config.gpu.clone();
    let snapshot = tokio::task::spawn_blocking(move || probe::probe_system(&gpu_config))
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("GPU probe task failed: {}", e);
            CapabilitySnapshot::unaccelerated()
        });

    // Load models before accepting any request
    let loader = HttpModelLoader::new(Duration::from_secs(config.server.request_timeout_secs));
    let registry = Arc::new(ModelRegistry::build(&snapshot, &config, &loader).await);

    tracing::info!(
        "GPU Acceleration: {}",
        if snapshot.accelerated() { "Enabled" } else { "Disabled" }
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(&config, snapshot, registry));

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
