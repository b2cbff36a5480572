//! Reasoning Steps
//!
//! One generated unit of reasoning, plus the schema variants a step may be
//! requested in.

use serde::{Deserialize, Serialize};

use crate::decode::decode_json;
use crate::error::{ReasonerError, Result};

/// One generated reasoning unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    /// The model's analytical thought
    pub thought: String,

    /// Whether the step asks for a side-effecting action
    #[serde(default, alias = "actionNeeded")]
    pub action_needed: bool,

    /// Self-reported confidence in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Whether the model considers the goal reached
    pub done: bool,

    /// Opaque action payload, present only when `action_needed`
    #[serde(
        default,
        alias = "actionRequest",
        alias = "request",
        skip_serializing_if = "Option::is_none"
    )]
    pub action_request: Option<serde_json::Value>,

    /// Findings the model wants carried forward
    #[serde(default, alias = "keyFindings")]
    pub key_findings: Vec<String>,
}

impl ReasoningStep {
    /// A plain thought with no action, confidence or findings
    pub fn thought(thought: impl Into<String>, done: bool) -> Self {
        Self {
            thought: thought.into(),
            action_needed: false,
            confidence: None,
            done,
            action_request: None,
            key_findings: Vec::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_action(mut self, request: serde_json::Value) -> Self {
        self.action_needed = true;
        self.action_request = Some(request);
        self
    }

    pub fn with_findings<I, S>(mut self, findings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_findings = findings.into_iter().map(Into::into).collect();
        self
    }

    /// Decode a model reply into a step of the given schema
    pub fn decode(content: &str, schema: StepSchema) -> Result<Self> {
        let mut step: ReasoningStep = decode_json(content)?;

        if schema == StepSchema::Reduced {
            step.action_needed = false;
            step.action_request = None;
            step.key_findings.clear();
        }

        step.check_schema()?;
        Ok(step)
    }

    /// Constraints serde alone can't express
    pub fn check_schema(&self) -> Result<()> {
        if self.thought.trim().is_empty() {
            return Err(ReasonerError::Decode("thought is empty".into()));
        }

        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ReasonerError::Decode(format!(
                    "confidence {} outside [0, 1]",
                    confidence
                )));
            }
        }

        match (self.action_needed, &self.action_request) {
            (true, None) => Err(ReasonerError::Decode(
                "action_needed is set but action_request is missing".into(),
            )),
            (false, Some(_)) => Err(ReasonerError::Decode(
                "action_request given without action_needed".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Whitespace-delimited word count of the thought
    pub fn word_count(&self) -> usize {
        self.thought.split_whitespace().count()
    }
}

/// Shape of the step the model is asked to produce
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepSchema {
    /// thought, action, confidence, done, findings
    #[default]
    Full,
    /// `{thought, done}` only
    Reduced,
}

impl StepSchema {
    /// Output-format instructions embedded in the system prompt
    pub fn format_instructions(&self) -> &'static str {
        match self {
            StepSchema::Full => FULL_FORMAT,
            StepSchema::Reduced => REDUCED_FORMAT,
        }
    }
}

const FULL_FORMAT: &str = r#"Respond STRICTLY in this JSON format:
{
  "thought": "Your analytical thought process",
  "action_needed": true/false,
  "action_request": {"tool": "action_name", "arguments": {}} or null,
  "confidence": 0.0-1.0,
  "done": true/false,
  "key_findings": ["finding1", "finding2"]
}"#;

const REDUCED_FORMAT: &str = r#"Reply ONLY as JSON: {"thought":"<next-thought>","done":true|false}"#;
