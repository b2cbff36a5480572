//! Session identity and outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::ReasoningContext;
use crate::step::ReasoningStep;
use crate::termination::TerminationReason;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a finished session produced
#[derive(Clone, Debug, Serialize)]
pub struct ReasoningOutcome<T> {
    pub session_id: SessionId,

    /// Final artifact from the synthesis call
    pub artifact: T,

    /// Trace sent to the synthesis call, review segment included
    pub trace: String,

    /// Whether a review pass was appended to the trace
    pub reviewed: bool,

    /// Accepted steps in order
    pub steps: Vec<ReasoningStep>,

    pub rejected_steps: usize,

    /// External failures absorbed under the resilient policy
    pub failed_calls: usize,

    /// Generation cycles spent
    pub iterations: usize,

    pub generation_calls: usize,

    pub termination: TerminationReason,

    /// Context as it stood when the loop ended
    pub context: ReasoningContext,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl<T> ReasoningOutcome<T> {
    /// Wall-clock duration of the session
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Whether the model declared the goal reached
    pub fn completed(&self) -> bool {
        self.steps.iter().any(|s| s.done)
    }
}
