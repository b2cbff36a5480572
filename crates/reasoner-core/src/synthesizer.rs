//! Output Synthesis
//!
//! Turns the accepted steps into a trace, adds a review pass when the model
//! never declared itself done, and asks for the final artifact.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::context::ReasoningContext;
use crate::decode::decode_json;
use crate::error::{ReasonerError, Result};
use crate::message::{bracket_list, Prompt};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::step::ReasoningStep;

/// Separator between steps in the trace
pub const STEP_DELIMITER: &str = "\n---\n";
const EMPTY_TRACE: &str = "No valid reasoning steps";

/// The final artifact plus the trace it was built from
#[derive(Clone, Debug)]
pub struct Synthesis<T> {
    pub artifact: T,
    pub trace: String,
    pub reviewed: bool,
}

/// Builds the final artifact from the accepted steps
pub struct OutputSynthesizer {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    review_instructions: String,
    synthesis_instructions: String,
    closing_instructions: String,
}

impl OutputSynthesizer {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        options: GenerationOptions,
        review_instructions: impl Into<String>,
        synthesis_instructions: impl Into<String>,
        closing_instructions: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            options,
            review_instructions: review_instructions.into(),
            synthesis_instructions: synthesis_instructions.into(),
            closing_instructions: closing_instructions.into(),
        }
    }

    /// Render accepted steps as the reasoning trace
    pub fn build_trace(steps: &[ReasoningStep]) -> String {
        if steps.is_empty() {
            return EMPTY_TRACE.into();
        }

        steps
            .iter()
            .map(|step| {
                let confidence = step
                    .confidence
                    .map_or_else(|| "n/a".to_string(), |c| format!("{:.2}", c));
                format!(
                    "Step: {}\nConfidence: {}\nKey Findings: {}",
                    step.thought,
                    confidence,
                    bracket_list(&step.key_findings)
                )
            })
            .collect::<Vec<_>>()
            .join(STEP_DELIMITER)
    }

    /// Trace for the final call, with a "Review:" segment appended when no
    /// accepted step was done. Returns the trace and whether it was reviewed.
    pub async fn prepare_trace(&self, steps: &[ReasoningStep]) -> Result<(String, bool)> {
        let trace = Self::build_trace(steps);
        if steps.iter().any(|s| s.done) {
            return Ok((trace, false));
        }

        tracing::info!("No completion reached, adding review step");
        let prompt = Prompt::new(
            &self.review_instructions,
            format!(
                "Reasoning trace: {}\n\nProvide your review thought to improve the reasoning.",
                trace
            ),
        );
        let review = self
            .provider
            .complete_prompt(&prompt, &self.options.text())
            .await
            .map_err(|e| ReasonerError::Synthesis(format!("review failed: {}", e)))?;

        Ok((
            format!("{}{}Review: {}", trace, STEP_DELIMITER, review.content.trim()),
            true,
        ))
    }

    pub fn build_prompt(&self, trace: &str, context: &ReasoningContext) -> Result<Prompt> {
        let observations = serde_json::to_string(context.observations())?;
        Ok(Prompt::new(
            &self.synthesis_instructions,
            format!(
                "Task: {}\nGoal: {}\n\nREASONING PROCESS:\n{}\n\nOBSERVATIONS:\n{}\n\nKEY FINDINGS:\n{}\n\nFINAL INSTRUCTIONS:\n{}",
                context.task(),
                context.goal(),
                trace,
                observations,
                bracket_list(context.key_findings()),
                self.closing_instructions,
            ),
        ))
    }

    async fn final_call(
        &self,
        steps: &[ReasoningStep],
        context: &ReasoningContext,
        options: &GenerationOptions,
    ) -> Result<(String, String, bool)> {
        let (trace, reviewed) = self.prepare_trace(steps).await?;
        let prompt = self.build_prompt(&trace, context)?;
        let completion = self
            .provider
            .complete_prompt(&prompt, options)
            .await
            .map_err(|e| ReasonerError::Synthesis(e.to_string()))?;
        Ok((completion.content, trace, reviewed))
    }

    /// Final artifact as free text
    pub async fn synthesize_text(
        &self,
        steps: &[ReasoningStep],
        context: &ReasoningContext,
    ) -> Result<Synthesis<String>> {
        let (content, trace, reviewed) = self.final_call(steps, context, &self.options.text()).await?;
        Ok(Synthesis {
            artifact: content.trim().to_string(),
            trace,
            reviewed,
        })
    }

    /// Final artifact decoded from the reply's JSON
    pub async fn synthesize<T: DeserializeOwned>(
        &self,
        steps: &[ReasoningStep],
        context: &ReasoningContext,
    ) -> Result<Synthesis<T>> {
        let (content, trace, reviewed) = self.final_call(steps, context, &self.options.json()).await?;
        let artifact = decode_json(&content)
            .map_err(|e| ReasonerError::Synthesis(format!("artifact decode failed: {}", e)))?;
        Ok(Synthesis {
            artifact,
            trace,
            reviewed,
        })
    }
}
