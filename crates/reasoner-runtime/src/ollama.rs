//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference.

use std::time::Duration;

use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    error::OllamaError,
    generation::{
        chat::{ChatMessage, ChatMessageResponse, MessageRole, request::ChatMessageRequest},
        parameters::FormatType,
    },
    models::ModelOptions,
};
use reasoner_core::{
    error::{ReasonerError, Result},
    message::{Message, Role},
    provider::{Completion, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo},
};

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            timeout_secs: 120,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("OLLAMA_HOST").unwrap_or(defaults.host);
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let timeout_secs = std::env::var("OLLAMA_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        Self {
            host,
            port,
            timeout_secs,
        }
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider with custom host/port
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        Self::from_config(OllamaConfig {
            host: host.into(),
            port,
            ..Default::default()
        })
    }

    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReasonerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client: Ollama::new_with_client(config.host.as_str(), config.port, http),
            config,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OllamaConfig::from_env())
    }

    /// Create with default localhost settings
    pub fn localhost() -> Result<Self> {
        Self::from_config(OllamaConfig::default())
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Convert prompt messages to Ollama format
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => MessageRole::System,
                    Role::User => MessageRole::User,
                    Role::Assistant => MessageRole::Assistant,
                };
                ChatMessage::new(role, m.content.clone())
            })
            .collect()
    }

    /// Build the chat request, JSON-constrained when asked
    fn build_request(messages: &[Message], opts: &GenerationOptions) -> ChatMessageRequest {
        let mut model_options = ModelOptions::default()
            .temperature(opts.temperature)
            .top_p(opts.top_p)
            .num_predict(i32::try_from(opts.max_tokens).unwrap_or(i32::MAX));
        if !opts.stop_sequences.is_empty() {
            model_options = model_options.stop(opts.stop_sequences.clone());
        }

        let request = ChatMessageRequest::new(opts.model.clone(), Self::convert_messages(messages))
            .options(model_options);
        if opts.json_output {
            request.format(FormatType::Json)
        } else {
            request
        }
    }

    fn convert_completion(response: ChatMessageResponse, model: &str) -> Completion {
        Completion::text(response.message.content, model)
    }

    /// Connection failures and 5xx mean Ollama is down; 429 is rate limiting
    fn map_error(e: OllamaError) -> ReasonerError {
        match e {
            OllamaError::ReqwestError(err) if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) => {
                ReasonerError::RateLimited(err.to_string())
            }
            OllamaError::ReqwestError(err)
                if err.is_connect()
                    || err.is_timeout()
                    || err.status().is_some_and(|s| s.is_server_error()) =>
            {
                ReasonerError::ProviderUnavailable(err.to_string())
            }
            other => ReasonerError::Provider(other.to_string()),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: "Ollama".into(),
            models,
            supports_json_output: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.list_local_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = Self::build_request(messages, options);
        tracing::debug!(model = %options.model, json = options.json_output, "Sending chat request");

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(Self::map_error)?;

        Ok(Self::convert_completion(response, &options.model))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let models = self
            .client
            .list_local_models()
            .await
            .map_err(|e| ReasonerError::ProviderUnavailable(e.to_string()))?;

        Ok(models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.clone(),
                name: m.name,
                context_length: None, // Not exposed by /api/tags
            })
            .collect())
    }
}
