//! Engine Configuration
//!
//! Thresholds and prompt templates for one reasoning engine. Every knob
//! has a default; `from_env` overrides them from `REASONER_*` variables.

use serde::{Deserialize, Serialize};

use crate::context::DEFAULT_RECENT_THOUGHTS;
use crate::error::{ReasonerError, Result};
use crate::step::StepSchema;

/// How external service failures inside a cycle are handled
///
/// Only errors that reach the engine count: provider calls and dispatchers
/// that return `Err`. `ToolRegistry` never does; it turns tool errors into
/// failed `ToolResult` observations, so a bad tool call continues the
/// session under either policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the session with the error
    #[default]
    FailFast,
    /// Record the failure as feedback, spend the iteration, keep going
    Resilient,
}

impl std::str::FromStr for FailurePolicy {
    type Err = ReasonerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fail_fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "resilient" => Ok(FailurePolicy::Resilient),
            other => Err(ReasonerError::Config(format!("unknown failure policy '{}'", other))),
        }
    }
}

/// Loop thresholds
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on generation cycles per session
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Confidence at which a step with no open questions ends the loop
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Minimum words in an accepted thought
    #[serde(default = "default_min_words")]
    pub min_words: usize,

    /// Thoughts inspected by the stagnation check
    #[serde(default = "default_stagnation_window")]
    pub stagnation_window: usize,

    /// Diversity ratio under which the window counts as stagnant
    #[serde(default = "default_diversity_cutoff")]
    pub diversity_cutoff: f64,

    /// Reflect on every n-th iteration
    #[serde(default = "default_reflection_interval")]
    pub reflection_interval: usize,

    /// Capacity of the recent-thought window
    #[serde(default = "default_recent_thoughts")]
    pub recent_thoughts: usize,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub schema: StepSchema,
}

fn default_max_iterations() -> usize {
    10
}

fn default_confidence_threshold() -> f64 {
    0.8
}

fn default_min_words() -> usize {
    15
}

fn default_stagnation_window() -> usize {
    3
}

fn default_diversity_cutoff() -> f64 {
    0.3
}

fn default_reflection_interval() -> usize {
    3
}

fn default_recent_thoughts() -> usize {
    DEFAULT_RECENT_THOUGHTS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            confidence_threshold: default_confidence_threshold(),
            min_words: default_min_words(),
            stagnation_window: default_stagnation_window(),
            diversity_cutoff: default_diversity_cutoff(),
            reflection_interval: default_reflection_interval(),
            recent_thoughts: default_recent_thoughts(),
            failure_policy: FailurePolicy::default(),
            schema: StepSchema::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by any `REASONER_*` variables that are set
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse("REASONER_MAX_ITERATIONS")? {
            config.max_iterations = v;
        }
        if let Some(v) = env_parse("REASONER_CONFIDENCE_THRESHOLD")? {
            config.confidence_threshold = v;
        }
        if let Some(v) = env_parse("REASONER_MIN_WORDS")? {
            config.min_words = v;
        }
        if let Some(v) = env_parse("REASONER_STAGNATION_WINDOW")? {
            config.stagnation_window = v;
        }
        if let Some(v) = env_parse("REASONER_DIVERSITY_CUTOFF")? {
            config.diversity_cutoff = v;
        }
        if let Some(v) = env_parse("REASONER_REFLECTION_INTERVAL")? {
            config.reflection_interval = v;
        }
        if let Ok(policy) = std::env::var("REASONER_FAILURE_POLICY") {
            config.failure_policy = policy.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(ReasonerError::Config("max_iterations must be at least 1".into()));
        }
        if self.stagnation_window == 0 {
            return Err(ReasonerError::Config("stagnation_window must be at least 1".into()));
        }
        if self.recent_thoughts < self.stagnation_window {
            return Err(ReasonerError::Config(format!(
                "recent_thoughts ({}) must hold the stagnation window ({})",
                self.recent_thoughts, self.stagnation_window
            )));
        }
        if self.reflection_interval == 0 {
            return Err(ReasonerError::Config("reflection_interval must be at least 1".into()));
        }
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("diversity_cutoff", self.diversity_cutoff),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReasonerError::Config(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ReasonerError::Config(format!("{} has invalid value '{}'", key, raw))),
        Err(_) => Ok(None),
    }
}

/// System instructions for each kind of call the engine makes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptTemplates {
    /// Preamble for step generation; the step format is appended per schema
    pub reasoning: String,
    /// User message closing every step prompt
    pub continue_instruction: String,
    pub reflection: String,
    pub review: String,
    /// Instructions for the final artifact
    pub synthesis: String,
    /// Closing instructions in the synthesis user prompt
    pub synthesis_instructions: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            reasoning: DEFAULT_REASONING_PROMPT.into(),
            continue_instruction: "Continue reasoning towards the goal.".into(),
            reflection: DEFAULT_REFLECTION_PROMPT.into(),
            review: DEFAULT_REVIEW_PROMPT.into(),
            synthesis: DEFAULT_SYNTHESIS_PROMPT.into(),
            synthesis_instructions: "Use all available information. If any gaps remain, acknowledge them.\nAdd analytical insights where possible.".into(),
        }
    }
}

impl PromptTemplates {
    /// Templates for the reduced issue-operation flow
    pub fn issue_operation() -> Self {
        Self {
            reasoning: ISSUE_OPERATION_PROMPT.into(),
            continue_instruction: "Produce the next reasoning thought.\nEnsure it's substantial and moves forward.\nSet done=true only if fully ready to execute the issue operation.".into(),
            synthesis: "You are to execute the issue operation based on the provided reasoning trace.\nUse the reasoning trace to determine the correct action for the issue operation.".into(),
            synthesis_instructions: "Produce the final result of the issue operation.".into(),
            ..Self::default()
        }
    }
}

const DEFAULT_REASONING_PROMPT: &str = r#"You are an expert reasoning agent. Analyze the task and provide structured reasoning.

Guidelines:
1. Break down complex problems into subtasks
2. Assess confidence in your reasoning
3. Identify what information is missing
4. Specify clear actions when needed
5. Document key findings at each step"#;

const ISSUE_OPERATION_PROMPT: &str = r#"You are iteratively reasoning before executing an issue operation.
Requirements:
    1. Each thought must be substantial
    2. Progress logically from previous thoughts
    3. When ready to execute, set done=true"#;

const DEFAULT_REFLECTION_PROMPT: &str = r#"Reflect on the reasoning progress so far. Identify:
1. What has been accomplished
2. What remains unclear
3. Potential blind spots
4. Suggestions for more effective reasoning

Be concise and actionable."#;

const DEFAULT_REVIEW_PROMPT: &str = r#"You are reviewing the prior reasoning steps for completeness and coherence.
Identify any gaps or weaknesses and suggest improvements.
Reply ONLY with your review thought."#;

const DEFAULT_SYNTHESIS_PROMPT: &str = r#"Produce the final result based on the reasoning process and observations.
Return a single JSON object. Ensure accuracy and completeness."#;
