//! Tool System
//!
//! In-process tools behind the `ActionDispatcher` seam. An action request
//! is read as `{"tool": name, "arguments": {...}}` and routed to the
//! registered tool; the serialized `ToolResult` becomes the observation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatch::{ActionDescriptor, ActionDispatcher};
use crate::error::{ReasonerError, Result};

/// Tool call decoded from an action request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    #[serde(alias = "tool")]
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, serde_json::Value>,

    /// Optional call ID for tracking
    #[serde(default)]
    pub id: Option<String>,
}

impl ToolCall {
    pub fn from_request(request: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(request.clone())
            .map_err(|e| ReasonerError::ToolValidation(format!("Malformed action request: {}", e)))
    }
}

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID (if provided in request)
    pub id: Option<String>,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (success message or error)
    pub output: String,

    /// Structured data (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

/// Tool definition schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// One-line description including parameters, for the step prompt
    pub fn describe(&self) -> ActionDescriptor {
        if self.parameters.is_empty() {
            return ActionDescriptor::new(&self.name, &self.description);
        }

        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| {
                let required = if p.required { ", required" } else { "" };
                format!("{} ({}{})", p.name, p.param_type, required)
            })
            .collect();
        ActionDescriptor::new(
            &self.name,
            format!("{} Parameters: {}", self.description, params.join(", ")),
        )
    }
}

/// Tool trait - implement to add new actions
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;

    /// Validate arguments before execution (optional)
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            if param.required && !call.arguments.contains_key(&param.name) {
                return Err(ReasonerError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Registry for available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let schema = tool.schema();
        self.tools.insert(schema.name.clone(), Arc::new(tool));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Execute a tool call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ReasonerError::ToolNotFound(call.name.clone()))?;

        tool.validate(call)?;
        tool.execute(call).await
    }

    /// Tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl ActionDispatcher for ToolRegistry {
    fn describe(&self) -> Vec<ActionDescriptor> {
        let mut descriptors: Vec<ActionDescriptor> =
            self.tools.values().map(|t| t.schema().describe()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Tool failures come back as failed results so the model can react to
    /// them on the next step.
    async fn dispatch(&self, request: &serde_json::Value) -> Result<serde_json::Value> {
        let result = match ToolCall::from_request(request) {
            Ok(call) => {
                tracing::debug!(tool = %call.name, "Executing tool");
                match self.execute(&call).await {
                    Ok(mut result) => {
                        result.id = call.id.clone();
                        result
                    }
                    Err(e) => {
                        let mut failed = ToolResult::failure(&call.name, format!("Error: {}", e));
                        failed.id = call.id.clone();
                        failed
                    }
                }
            }
            Err(e) => ToolResult::failure("unknown", format!("Error: {}", e)),
        };

        Ok(serde_json::to_value(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".into(),
                description: "Echo the text back".into(),
                parameters: vec![ParameterSchema {
                    name: "text".into(),
                    param_type: "string".into(),
                    description: "Text to echo".into(),
                    required: true,
                }],
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            let text = call.arguments.get("text").and_then(|v| v.as_str()).unwrap_or_default();
            Ok(ToolResult::success("echo", text))
        }
    }

    #[test]
    fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        assert_eq!(registry.len(), 1);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("unknown").is_none());
        assert_eq!(registry.names(), vec!["echo"]);
    }

    #[test]
    fn test_describe_includes_parameters() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let actions = registry.describe();
        assert_eq!(actions.len(), 1);
        assert!(actions[0].description.contains("text (string, required)"));
    }

    #[tokio::test]
    async fn test_dispatch_runs_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let observation = registry
            .dispatch(&json!({"tool": "echo", "arguments": {"text": "hi"}, "id": "c1"}))
            .await
            .unwrap();

        assert_eq!(observation["success"], true);
        assert_eq!(observation["output"], "hi");
        assert_eq!(observation["id"], "c1");
    }

    #[tokio::test]
    async fn test_dispatch_failures_become_observations() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let missing = registry.dispatch(&json!({"tool": "nope"})).await.unwrap();
        assert_eq!(missing["success"], false);

        let invalid = registry.dispatch(&json!({"tool": "echo", "arguments": {}})).await.unwrap();
        assert_eq!(invalid["success"], false);
        assert!(invalid["output"].as_str().unwrap().contains("Missing required parameter"));

        let malformed = registry.dispatch(&json!("just a string")).await.unwrap();
        assert_eq!(malformed["success"], false);
    }
}
