//! # reasoner-core
//!
//! Bounded, self-correcting reasoning loop over a provider-agnostic LLM
//! abstraction.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        ReasoningEngine                           │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────────┐  │
//! │  │    Step     │  │    Step     │  │  TerminationPolicy       │  │
//! │  │  Generator  │──│  Validator  │──│  (+ StagnationDetector)  │  │
//! │  └─────────────┘  └─────────────┘  └──────────────────────────┘  │
//! │         │                │                                       │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────────┐  │
//! │  │ LlmProvider │  │ Reasoning   │  │  ActionDispatcher        │  │
//! │  │ (Strategy)  │  │  Context    │  │  (ToolRegistry, HTTP..)  │  │
//! │  └─────────────┘  └─────────────┘  └──────────────────────────┘  │
//! │         │                                                        │
//! │  ┌─────────────┐  ┌─────────────┐                                │
//! │  │ Reflection  │  │   Output    │                                │
//! │  │ Scheduler   │  │ Synthesizer │                                │
//! │  └─────────────┘  └─────────────┘                                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait lets the engine run against Ollama or any other
//! backend. Actions go through `ActionDispatcher`, so the loop never knows
//! what an action actually does.

pub mod config;
pub mod context;
pub mod decode;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod generator;
pub mod message;
pub mod provider;
pub mod reflection;
pub mod session;
pub mod signals;
pub mod stagnation;
pub mod step;
pub mod synthesizer;
pub mod termination;
pub mod tool;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{EngineConfig, FailurePolicy, PromptTemplates};
pub use context::ReasoningContext;
pub use dispatch::{ActionDescriptor, ActionDispatcher, NoActions};
pub use engine::{ReasoningEngine, ReasoningEngineBuilder};
pub use error::{ReasonerError, Result};
pub use message::{Message, Prompt, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo};
pub use session::{ReasoningOutcome, SessionId};
pub use signals::{HeuristicExtractor, SignalExtractor};
pub use step::{ReasoningStep, StepSchema};
pub use termination::TerminationReason;
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
