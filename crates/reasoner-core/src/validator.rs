//! Step acceptance rules.

use serde::{Deserialize, Serialize};

use crate::context::ReasoningContext;
use crate::step::ReasoningStep;

/// Outcome of validating one generated step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub error: Option<String>,
    /// Non-blocking advice; may be present on valid steps
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
            suggestions: Vec::new(),
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

/// Decides whether a generated step enters the trace
#[derive(Clone, Debug)]
pub struct StepValidator {
    min_words: usize,
}

impl Default for StepValidator {
    fn default() -> Self {
        Self::new(15)
    }
}

impl StepValidator {
    pub fn new(min_words: usize) -> Self {
        Self { min_words }
    }

    pub fn min_words(&self) -> usize {
        self.min_words
    }

    /// Validate a step against the session so far. `None` stands for a
    /// reply that could not be decoded.
    pub fn validate(&self, step: Option<&ReasoningStep>, context: &ReasoningContext) -> ValidationResult {
        let Some(step) = step else {
            return ValidationResult::invalid("Step could not be decoded")
                .with_suggestions(vec!["Reply with a single JSON object matching the step format".into()]);
        };

        let mut errors = Vec::new();
        let mut suggestions = Vec::new();

        let words = step.word_count();
        if words < self.min_words {
            errors.push(format!(
                "Thought too brief ({} words, minimum {})",
                words, self.min_words
            ));
            suggestions.push("Expand reasoning with more analysis".into());
        }

        if context.has_seen_thought(&step.thought) {
            errors.push("Duplicate thought detected".into());
            suggestions.push("Move the reasoning forward instead of repeating an earlier thought".into());
        }

        let lower = step.thought.to_lowercase();
        if lower.contains("i don't know") || lower.contains("not sure") {
            suggestions.push("Re-frame uncertainty as specific questions to investigate".into());
        }

        if step.action_needed && step.confidence.is_some_and(|c| c > 0.9) {
            suggestions.push("High confidence with action needed - consider if action is necessary".into());
        }

        if errors.is_empty() {
            ValidationResult::valid().with_suggestions(suggestions)
        } else {
            ValidationResult::invalid(errors.join("; ")).with_suggestions(suggestions)
        }
    }
}
