//! # reasoner-runtime
//!
//! Runtime providers and action clients for the reasoning engine.
//!
//! ## Providers
//!
//! - **Ollama** (default): Local LLM inference via Ollama
//!
//! ## Action dispatchers
//!
//! - **HTTP** (default): POST each action request to one endpoint
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reasoner_runtime::ollama::OllamaProvider;
//!
//! let provider = OllamaProvider::from_env()?;
//! let engine = ReasoningEngine::builder()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "http-actions")]
pub mod http_action;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

#[cfg(feature = "http-actions")]
pub use http_action::{HttpActionClient, HttpActionConfig};

// Re-export core types for convenience
pub use reasoner_core::{
    ActionDispatcher, LlmProvider, Message, ReasonerError, ReasoningEngine, Result, Role,
    ToolRegistry,
};
