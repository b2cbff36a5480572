//! Application State

use std::sync::Arc;

use reasoner_core::{
    ActionDispatcher, EngineConfig, LlmProvider, PromptTemplates, ReasoningEngine, Result,
    StepSchema,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM provider (Ollama, etc.)
    pub provider: Arc<dyn LlmProvider>,

    /// Where action requests go
    pub dispatcher: Arc<dyn ActionDispatcher>,

    pub engine_config: EngineConfig,

    /// Model used when a request doesn't name one
    pub default_model: String,
}

impl AppState {
    /// Engine for the open-ended reasoning route
    pub fn reasoning_engine(&self, model: Option<&str>) -> Result<ReasoningEngine> {
        ReasoningEngine::builder()
            .provider(self.provider.clone())
            .dispatcher(self.dispatcher.clone())
            .config(self.engine_config.clone())
            .model(model.unwrap_or(&self.default_model))
            .build()
    }

    /// Engine for issue operations: reduced schema, issue templates
    pub fn issue_engine(&self, model: Option<&str>) -> Result<ReasoningEngine> {
        ReasoningEngine::builder()
            .provider(self.provider.clone())
            .dispatcher(self.dispatcher.clone())
            .config(self.engine_config.clone())
            .templates(PromptTemplates::issue_operation())
            .schema(StepSchema::Reduced)
            .model(model.unwrap_or(&self.default_model))
            .build()
    }
}
