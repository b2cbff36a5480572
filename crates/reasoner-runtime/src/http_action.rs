//! HTTP action client
//!
//! Forwards a step's opaque action request to an external endpoint and
//! returns the endpoint's JSON reply as the observation.

use std::time::Duration;

use async_trait::async_trait;
use reasoner_core::{
    dispatch::{ActionDescriptor, ActionDispatcher},
    error::{ReasonerError, Result},
};
use serde_json::Value;

/// Action endpoint configuration
#[derive(Clone, Debug)]
pub struct HttpActionConfig {
    /// URL the request body is POSTed to
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// How the endpoint is advertised to the model
    pub description: String,
}

impl HttpActionConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: 30,
            description: "Send a JSON request to the action service".into(),
        }
    }

    /// `None` when `ACTION_ENDPOINT` is unset
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("ACTION_ENDPOINT").ok().filter(|e| !e.trim().is_empty())?;
        let mut config = Self::new(endpoint);
        if let Some(timeout) = std::env::var("ACTION_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
        {
            config.timeout_secs = timeout;
        }
        if let Ok(description) = std::env::var("ACTION_DESCRIPTION") {
            config.description = description;
        }
        Some(config)
    }
}

/// Dispatches every action request to one HTTP endpoint
pub struct HttpActionClient {
    client: reqwest::Client,
    config: HttpActionConfig,
}

impl HttpActionClient {
    pub fn new(config: HttpActionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReasonerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl ActionDispatcher for HttpActionClient {
    fn describe(&self) -> Vec<ActionDescriptor> {
        vec![ActionDescriptor::new("http_action", &self.config.description)]
    }

    async fn dispatch(&self, request: &Value) -> Result<Value> {
        tracing::info!(endpoint = %self.config.endpoint, "Dispatching action request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ReasonerError::ToolExecution(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ReasonerError::ToolExecution(e.to_string()))?;

        if !status.is_success() {
            return Err(ReasonerError::ToolExecution(format!("HTTP {}: {}", status, body)));
        }

        // Non-JSON replies are still useful observations.
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}
