//! HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use reasoner_core::{ModelInfo, ReasonerError, ReasoningOutcome};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub ollama_connected: bool,
    pub actions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReasoningRequest {
    pub task: String,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueOperationRequest {
    pub issue_id: String,
    pub request: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
            code: "INVALID_REQUEST".into(),
        }),
    )
}

fn engine_error(e: &ReasonerError) -> ApiError {
    tracing::error!("Reasoning error: {}", e);
    let (status, code) = match e {
        ReasonerError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        ReasonerError::ProviderUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE"),
        ReasonerError::Synthesis(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SYNTHESIS_ERROR"),
        ReasonerError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "REASONING_ERROR"),
    };
    (
        status,
        Json(ErrorResponse {
            error: e.user_message(),
            code: code.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ollama_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        ollama_connected,
        actions: state.dispatcher.describe().into_iter().map(|a| a.name).collect(),
    })
}

/// List models known to the provider
pub async fn list_models(State(state): State<AppState>) -> Result<Json<Vec<ModelInfo>>, ApiError> {
    state
        .provider
        .list_models()
        .await
        .map(Json)
        .map_err(|e| engine_error(&e))
}

/// Open-ended reasoning with a JSON artifact
pub async fn reasoning_handler(
    State(state): State<AppState>,
    Json(payload): Json<ReasoningRequest>,
) -> Result<Json<ReasoningOutcome<Value>>, ApiError> {
    if payload.task.trim().is_empty() {
        return Err(bad_request("task must not be empty"));
    }
    let goal = payload
        .goal
        .filter(|g| !g.trim().is_empty())
        .unwrap_or_else(|| "Complete the task accurately".into());

    let engine = state
        .reasoning_engine(payload.model.as_deref())
        .map_err(|e| engine_error(&e))?;

    engine
        .run(payload.task, goal)
        .await
        .map(Json)
        .map_err(|e| engine_error(&e))
}

/// Reduced-schema reasoning before an issue operation; text artifact
pub async fn issue_operation_handler(
    State(state): State<AppState>,
    Json(payload): Json<IssueOperationRequest>,
) -> Result<Json<ReasoningOutcome<String>>, ApiError> {
    if payload.issue_id.trim().is_empty() || payload.request.trim().is_empty() {
        return Err(bad_request("issue_id and request must not be empty"));
    }

    let engine = state
        .issue_engine(payload.model.as_deref())
        .map_err(|e| engine_error(&e))?;

    let task = format!("how to {} for issue {}", payload.request.trim(), payload.issue_id.trim());
    engine
        .run_text(task, "Execute the issue operation")
        .await
        .map(Json)
        .map_err(|e| engine_error(&e))
}
