// HTTP route handlers for the coderun API

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use coderun_common::types::{
    ExecutionResult, ExecutionStatus, RunRequest, RunResponse, MISSING_INPUT_MESSAGE,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use crate::{metrics, AppState};

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub id: &'static str,
    pub extension: &'static str,
    pub compiled: bool,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageInfo>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub uptime_seconds: u64,
}

/// POST /run - Execute code and return its output
pub async fn run_code(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> (StatusCode, Json<RunResponse>) {
    let validated = match payload {
        Ok(Json(request)) => request.validated(),
        Err(rejection) => {
            debug!("Rejected undecodable body: {}", rejection);
            None
        }
    };

    let Some((language, code)) = validated else {
        metrics::record_run_rejected("missing_input");
        return (
            StatusCode::BAD_REQUEST,
            Json(RunResponse {
                output: MISSING_INPUT_MESSAGE.to_string(),
            }),
        );
    };

    // Arbitrary user strings would blow up label cardinality
    let label = if state.engine.registry().resolve(&language).is_some() {
        language.clone()
    } else {
        ExecutionStatus::Unsupported.to_string()
    };
    metrics::record_run_submitted(&label);

    // A panic inside the engine must become a response, not a dropped connection
    let engine = state.engine.clone();
    let result = match tokio::spawn(async move { engine.run(&language, &code).await }).await {
        Ok(result) => result,
        Err(e) => {
            error!("Execution task failed: {}", e);
            ExecutionResult::internal_fault(format!("execution task failed: {}", e))
        }
    };

    metrics::record_run_completed(&label, result.status.as_str(), result.execution_time_ms as f64);

    (StatusCode::OK, Json(result.into_response()))
}

/// GET /languages - Supported language ids
pub async fn list_languages(State(state): State<Arc<AppState>>) -> Json<LanguagesResponse> {
    let languages = state
        .engine
        .registry()
        .profiles()
        .iter()
        .map(|p| LanguageInfo {
            id: p.id,
            extension: p.extension,
            compiled: p.is_compiled(),
        })
        .collect();

    Json(LanguagesResponse { languages })
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        started_at: state.started_at,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics - Prometheus exposition
pub async fn metrics_endpoint() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                String::new(),
            )
        }
    }
}
