//! reasoner HTTP Server
//!
//! Axum-based server exposing the reasoning engine over a REST API.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reasoner_core::{ActionDispatcher, LlmProvider, NoActions};
use reasoner_runtime::{HttpActionClient, HttpActionConfig, OllamaProvider};

use crate::config::ServerConfig;
use crate::handlers::{health_check, issue_operation_handler, list_models, reasoning_handler};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;

    // Initialize LLM provider
    let provider: Arc<dyn LlmProvider> = Arc::new(OllamaProvider::from_env()?);

    // Verify Ollama connection
    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to Ollama");
            if let Ok(models) = provider.list_models().await {
                for model in models {
                    tracing::info!("  Model: {}", model.id);
                }
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Ollama not available - reasoning requests will fail");
            tracing::warn!("  Make sure Ollama is running: ollama serve");
        }
    }

    // Initialize action dispatcher
    let dispatcher: Arc<dyn ActionDispatcher> = match HttpActionConfig::from_env() {
        Some(action_config) => {
            tracing::info!("✓ Actions dispatched to {}", action_config.endpoint);
            Arc::new(HttpActionClient::new(action_config)?)
        }
        None => {
            tracing::warn!("⚠ ACTION_ENDPOINT not set - actions disabled");
            Arc::new(NoActions)
        }
    };

    let state = AppState {
        provider,
        dispatcher,
        engine_config: config.engine.clone(),
        default_model: config.model.clone(),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 reasoner server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health               - Health check");
    tracing::info!("  GET  /api/models           - List available models");
    tracing::info!("  POST /api/reasoning        - Run a reasoning session");
    tracing::info!("  POST /api/issue-operation  - Reason before an issue operation");

    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))
        // Reasoning API
        .route("/api/reasoning", post(reasoning_handler))
        .route("/api/issue-operation", post(issue_operation_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
