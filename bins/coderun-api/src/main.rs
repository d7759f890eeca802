mod handlers;
mod routes;
mod metrics;

use anyhow::Context;
use axum::Router;
use coderun_common::Config;
use coderun_engine::{ExecutionEngine, LocalEngine};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

pub struct AppState {
    pub engine: Arc<dyn ExecutionEngine>,
    pub start_time: std::time::Instant,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(engine: Arc<dyn ExecutionEngine>) -> Self {
        Self {
            engine,
            start_time: std::time::Instant::now(),
            started_at: chrono::Utc::now(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    init_tracing(config.log_json);

    info!("coderun API booting...");

    // Initialize metrics
    metrics::init_metrics();
    info!("Metrics registry initialized");

    let engine = LocalEngine::from_config(&config);
    info!(
        languages = ?engine.registry().ids(),
        run_timeout_ms = config.run_timeout_ms,
        compile_timeout_ms = config.compile_timeout_ms,
        workspace_root = %config.workspace_root.display(),
        "Execution engine ready"
    );

    let state = Arc::new(AppState::new(Arc::new(engine)));

    // Build router
    let app = Router::new()
        .merge(routes::routes())
        .with_state(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, draining in-flight runs...");
}
