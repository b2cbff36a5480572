//! Action dispatch
//!
//! A step that sets `action_needed` carries an opaque request. The loop
//! hands it to an `ActionDispatcher` and records whatever comes back as an
//! observation, without interpreting either side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An action the model may request, as advertised in the step prompt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub name: String,
    pub description: String,
}

impl ActionDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Collaborator that performs side-effecting actions
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    /// Actions available to the model
    fn describe(&self) -> Vec<ActionDescriptor>;

    /// Perform one action and return its observation
    async fn dispatch(&self, request: &serde_json::Value) -> Result<serde_json::Value>;
}

/// Dispatcher for sessions that run without actions
pub struct NoActions;

#[async_trait]
impl ActionDispatcher for NoActions {
    fn describe(&self) -> Vec<ActionDescriptor> {
        Vec::new()
    }

    async fn dispatch(&self, request: &serde_json::Value) -> Result<serde_json::Value> {
        tracing::warn!(%request, "Action requested but no actions are configured");
        Ok(serde_json::json!({
            "success": false,
            "output": "No actions are available in this session",
        }))
    }
}

/// Prompt section listing the available actions
pub fn render_actions(actions: &[ActionDescriptor]) -> String {
    if actions.is_empty() {
        return "Available Actions: none".into();
    }

    let mut section = String::from("Available Actions:\n");
    for action in actions {
        section.push_str(&format!("- {}: {}\n", action.name, action.description));
    }
    section
}
