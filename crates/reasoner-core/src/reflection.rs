//! Periodic reflection on progress.

use std::sync::Arc;

use crate::context::ReasoningContext;
use crate::error::Result;
use crate::message::{bracket_list, Prompt};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::step::ReasoningStep;

/// Asks the model to critique progress every `interval` iterations
pub struct ReflectionScheduler {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    instructions: String,
    interval: usize,
}

impl ReflectionScheduler {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        options: GenerationOptions,
        instructions: impl Into<String>,
        interval: usize,
    ) -> Self {
        Self {
            provider,
            options: options.text(),
            instructions: instructions.into(),
            interval: interval.max(1),
        }
    }

    /// `iteration` is 1-based
    pub fn is_due(&self, iteration: usize) -> bool {
        iteration > 0 && iteration % self.interval == 0
    }

    pub fn build_prompt(&self, steps: &[ReasoningStep], context: &ReasoningContext) -> Prompt {
        let trail: Vec<&str> = steps.iter().map(|s| s.thought.as_str()).collect();
        Prompt::new(
            &self.instructions,
            format!(
                "Reasoning steps taken: {}\nCurrent findings: {}\nUnresolved questions: {}",
                trail.join(" -> "),
                bracket_list(context.key_findings()),
                bracket_list(context.unresolved_questions()),
            ),
        )
    }

    /// Critique the trace so far and return the reflection text
    pub async fn reflect(&self, steps: &[ReasoningStep], context: &ReasoningContext) -> Result<String> {
        let prompt = self.build_prompt(steps, context);
        let completion = self.provider.complete_prompt(&prompt, &self.options).await?;
        Ok(completion.content.trim().to_string())
    }
}
