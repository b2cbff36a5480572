//! Termination decisions.

use serde::{Deserialize, Serialize};

use crate::context::ReasoningContext;
use crate::stagnation::StagnationDetector;
use crate::step::ReasoningStep;

/// Why a session stopped generating
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The latest accepted step declared itself done
    Done,
    /// Confident step with no open questions left
    Confident,
    /// Iteration budget spent
    MaxIterations,
    /// Recent thoughts stopped saying anything new
    Stagnant,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::Done => write!(f, "done"),
            TerminationReason::Confident => write!(f, "confident"),
            TerminationReason::MaxIterations => write!(f, "max_iterations"),
            TerminationReason::Stagnant => write!(f, "stagnant"),
        }
    }
}

/// Combines step, context and budget signals into a stop decision
#[derive(Clone, Debug)]
pub struct TerminationPolicy {
    confidence_threshold: f64,
    max_iterations: usize,
    stagnation: StagnationDetector,
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self::new(0.8, 10, StagnationDetector::default())
    }
}

impl TerminationPolicy {
    pub fn new(confidence_threshold: f64, max_iterations: usize, stagnation: StagnationDetector) -> Self {
        Self {
            confidence_threshold,
            max_iterations,
            stagnation,
        }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Evaluate after an accepted step. `iteration` is 1-based.
    pub fn evaluate(
        &self,
        step: &ReasoningStep,
        context: &ReasoningContext,
        iteration: usize,
    ) -> Option<TerminationReason> {
        if step.done {
            return Some(TerminationReason::Done);
        }

        if step.confidence.is_some_and(|c| c >= self.confidence_threshold)
            && context.unresolved_questions().is_empty()
        {
            return Some(TerminationReason::Confident);
        }

        if iteration >= self.max_iterations {
            tracing::warn!("Max iterations reached without completion");
            return Some(TerminationReason::MaxIterations);
        }

        if self.stagnation.is_stagnant(context.recent_thoughts()) {
            tracing::warn!("Reasoning appears stagnant - terminating");
            return Some(TerminationReason::Stagnant);
        }

        None
    }
}
