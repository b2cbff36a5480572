//! Error Types

use thiserror::Error;

/// Result type alias for reasoning operations
pub type Result<T> = std::result::Result<T, ReasonerError>;

/// Reasoning error types
#[derive(Error, Debug)]
pub enum ReasonerError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Generated output did not match the expected schema
    #[error("Decode error: {0}")]
    Decode(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Review or final synthesis call failed
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl ReasonerError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReasonerError::ProviderUnavailable(_)
                | ReasonerError::RateLimited(_)
                | ReasonerError::Io(_)
        )
    }

    /// Errors raised by an external collaborator (model or action service)
    /// during a reasoning cycle, as opposed to bad output or bad config.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            ReasonerError::Provider(_)
                | ReasonerError::ProviderUnavailable(_)
                | ReasonerError::RateLimited(_)
                | ReasonerError::ToolNotFound(_)
                | ReasonerError::ToolValidation(_)
                | ReasonerError::ToolExecution(_)
                | ReasonerError::Io(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            ReasonerError::Provider(msg) => format!("The AI service encountered an error: {}", msg),
            ReasonerError::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            ReasonerError::Decode(_) => "The AI service returned output in an unexpected format.".into(),
            ReasonerError::ToolNotFound(name) => format!("The action '{}' is not available.", name),
            ReasonerError::ToolValidation(msg) => format!("Invalid action input: {}", msg),
            ReasonerError::ToolExecution(msg) => format!("Action error: {}", msg),
            ReasonerError::Synthesis(_) => "The final answer could not be produced. Please try again.".into(),
            ReasonerError::Config(msg) => format!("Invalid configuration: {}", msg),
            ReasonerError::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for ReasonerError {
    fn from(err: anyhow::Error) -> Self {
        ReasonerError::Other(err.to_string())
    }
}
