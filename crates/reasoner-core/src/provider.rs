//! LLM Provider Strategy Pattern
//!
//! Defines the interface the reasoning loop uses to reach a text-generation
//! service. The loop never knows which backend sits behind it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reasoner_core::provider::{GenerationOptions, LlmProvider};
//! use reasoner_core::message::Prompt;
//!
//! let provider = OllamaProvider::from_env();
//! let prompt = Prompt::new("You are terse.", "Say hi.");
//! let completion = provider.complete(&prompt.to_messages(), &GenerationOptions::default()).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{Message, Prompt};

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "llama3.2", "gpt-4", "claude-3-sonnet")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Top-p nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Stop sequences
    #[serde(default)]
    pub stop_sequences: Vec<String>,

    /// Ask the backend to constrain output to a JSON object
    #[serde(default)]
    pub json_output: bool,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_top_p() -> f32 {
    0.9
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "llama3.2".into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            stop_sequences: Vec::new(),
            json_output: false,
        }
    }
}

impl GenerationOptions {
    /// Same options with JSON output requested
    pub fn json(&self) -> Self {
        Self {
            json_output: true,
            ..self.clone()
        }
    }

    /// Same options with free-text output
    pub fn text(&self) -> Self {
        Self {
            json_output: false,
            ..self.clone()
        }
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// Plain completion with no usage data, mostly for providers that
    /// don't report it.
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
            finish_reason: Some(FinishReason::Stop),
        }
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
}

/// Provider metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "Ollama", "OpenAI")
    pub name: String,

    /// Available models
    pub models: Vec<ModelInfo>,

    /// Whether JSON-constrained output is supported
    pub supports_json_output: bool,
}

/// Information about a model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub context_length: Option<u32>,
}

/// Strategy trait for LLM providers
///
/// Implementations are shared read-only across concurrent sessions.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get provider information and capabilities
    async fn info(&self) -> Result<ProviderInfo>;

    /// Check if the provider is available and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Generate a completion from messages
    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion>;

    /// List available models
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Generate a completion for a system/user prompt pair
    async fn complete_prompt(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<Completion> {
        self.complete(&prompt.to_messages(), options).await
    }
}
