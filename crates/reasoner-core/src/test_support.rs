//! Shared fakes for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::PromptTemplates;
use crate::dispatch::{ActionDescriptor, ActionDispatcher};
use crate::error::{ReasonerError, Result};
use crate::message::{Message, Prompt, Role};
use crate::provider::{Completion, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo};

pub const SYSTEM_STEP: &str = "[step]";
pub const SYSTEM_REFLECT: &str = "[reflect]";
pub const SYSTEM_REVIEW: &str = "[review]";
pub const SYSTEM_SYNTH: &str = "[synthesize]";

pub fn test_templates() -> PromptTemplates {
    PromptTemplates {
        reasoning: SYSTEM_STEP.into(),
        continue_instruction: "Continue.".into(),
        reflection: SYSTEM_REFLECT.into(),
        review: SYSTEM_REVIEW.into(),
        synthesis: SYSTEM_SYNTH.into(),
        synthesis_instructions: "Finish.".into(),
    }
}

/// A long thought whose vocabulary is unique to `n`
pub fn thought(n: usize) -> String {
    format!(
        "Iteration {n} examines clue{n}a and clue{n}b while comparing source{n} with record{n} to refine answer{n} toward the stated goal today"
    )
}

pub fn step_json(thought: &str, done: bool, confidence: Option<f64>) -> String {
    let mut step = json!({ "thought": thought, "done": done });
    if let Some(c) = confidence {
        step["confidence"] = json!(c);
    }
    step.to_string()
}

#[derive(Default)]
struct Script {
    steps: VecDeque<std::result::Result<String, String>>,
    reflections: VecDeque<String>,
    reviews: VecDeque<String>,
    syntheses: VecDeque<String>,
    fail_synthesis: bool,
}

#[derive(Default)]
struct Calls {
    step_prompts: Vec<Prompt>,
    reflection: usize,
    review: usize,
    synthesis: usize,
    last_prompt: Option<Prompt>,
    last_options: Option<GenerationOptions>,
}

/// Provider that answers from per-call-kind queues, routed on the system
/// prompt prefix. Unscripted reflection, review and synthesis calls get a
/// canned reply; an exhausted step queue is a provider error.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<Script>,
    calls: Mutex<Calls>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(self, content: impl Into<String>) -> Self {
        self.script.lock().unwrap().steps.push_back(Ok(content.into()));
        self
    }

    pub fn step_error(self, message: impl Into<String>) -> Self {
        self.script.lock().unwrap().steps.push_back(Err(message.into()));
        self
    }

    pub fn reflection(self, text: impl Into<String>) -> Self {
        self.script.lock().unwrap().reflections.push_back(text.into());
        self
    }

    pub fn review(self, text: impl Into<String>) -> Self {
        self.script.lock().unwrap().reviews.push_back(text.into());
        self
    }

    pub fn synthesis(self, text: impl Into<String>) -> Self {
        self.script.lock().unwrap().syntheses.push_back(text.into());
        self
    }

    pub fn failing_synthesis(self) -> Self {
        self.script.lock().unwrap().fail_synthesis = true;
        self
    }

    pub fn step_calls(&self) -> usize {
        self.calls.lock().unwrap().step_prompts.len()
    }

    pub fn step_prompts(&self) -> Vec<Prompt> {
        self.calls.lock().unwrap().step_prompts.clone()
    }

    pub fn reflection_calls(&self) -> usize {
        self.calls.lock().unwrap().reflection
    }

    pub fn review_calls(&self) -> usize {
        self.calls.lock().unwrap().review
    }

    pub fn synthesis_calls(&self) -> usize {
        self.calls.lock().unwrap().synthesis
    }

    pub fn last_prompt(&self) -> Option<Prompt> {
        self.calls.lock().unwrap().last_prompt.clone()
    }

    pub fn last_options(&self) -> Option<GenerationOptions> {
        self.calls.lock().unwrap().last_options.clone()
    }

    fn answer(&self, prompt: &Prompt) -> Result<String> {
        let mut script = self.script.lock().unwrap();
        let mut calls = self.calls.lock().unwrap();

        if prompt.system.starts_with(SYSTEM_STEP) {
            calls.step_prompts.push(prompt.clone());
            return match script.steps.pop_front() {
                Some(Ok(content)) => Ok(content),
                Some(Err(message)) => Err(ReasonerError::Provider(message)),
                None => Err(ReasonerError::Provider("step script exhausted".into())),
            };
        }
        if prompt.system.starts_with(SYSTEM_REFLECT) {
            calls.reflection += 1;
            return Ok(script.reflections.pop_front().unwrap_or_else(|| "Keep going.".into()));
        }
        if prompt.system.starts_with(SYSTEM_REVIEW) {
            calls.review += 1;
            return Ok(script.reviews.pop_front().unwrap_or_else(|| "Looks coherent.".into()));
        }
        if prompt.system.starts_with(SYSTEM_SYNTH) {
            calls.synthesis += 1;
            if script.fail_synthesis {
                return Err(ReasonerError::Provider("synthesis unavailable".into()));
            }
            return Ok(script.syntheses.pop_front().unwrap_or_else(|| "final artifact".into()));
        }

        Err(ReasonerError::Provider(format!("unscripted prompt: {}", prompt.system)))
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Scripted".into(),
            models: self.list_models().await?,
            supports_json_output: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        let text_of = |role: Role| {
            messages
                .iter()
                .find(|m| m.role == role)
                .map(|m| m.content.clone())
                .unwrap_or_default()
        };
        let prompt = Prompt::new(text_of(Role::System), text_of(Role::User));

        {
            let mut calls = self.calls.lock().unwrap();
            calls.last_prompt = Some(prompt.clone());
            calls.last_options = Some(options.clone());
        }

        let content = self.answer(&prompt)?;
        Ok(Completion::text(content, &options.model))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            id: "scripted".into(),
            name: "scripted".into(),
            context_length: None,
        }])
    }
}

/// Dispatcher that echoes requests back and remembers them
#[derive(Default)]
pub struct RecordingDispatcher {
    requests: Mutex<Vec<Value>>,
    fail: bool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionDispatcher for RecordingDispatcher {
    fn describe(&self) -> Vec<ActionDescriptor> {
        vec![ActionDescriptor::new("search", "Search things")]
    }

    async fn dispatch(&self, request: &Value) -> Result<Value> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(ReasonerError::ToolExecution("endpoint refused".into()));
        }
        Ok(json!({ "echo": request }))
    }
}
