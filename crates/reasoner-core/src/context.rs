//! Reasoning Context
//!
//! Per-session accumulator. A context is owned by exactly one session and
//! dropped when the session ends.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

/// Default number of recent thoughts kept for stagnation checks
pub const DEFAULT_RECENT_THOUGHTS: usize = 5;

/// Mutable state for one reasoning session
///
/// Deserializing rebuilds the dedup indexes from `accepted_thoughts` and
/// `mentioned_entities`, so a restored context keeps rejecting repeats.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "ContextRepr")]
pub struct ReasoningContext {
    task: String,
    goal: String,
    key_findings: Vec<String>,
    recent_thoughts: VecDeque<String>,
    accepted_thoughts: Vec<String>,
    recent_capacity: usize,
    unresolved_questions: Vec<String>,
    feedback: Vec<String>,
    reflections: Vec<String>,
    observations: Vec<serde_json::Value>,
    confidence_scores: Vec<f64>,
    mentioned_entities: Vec<String>,
    step_count: usize,
    #[serde(skip)]
    entity_index: HashSet<String>,
    #[serde(skip)]
    seen_thoughts: HashSet<String>,
}

impl ReasoningContext {
    pub fn new(task: impl Into<String>, goal: impl Into<String>) -> Self {
        Self::with_capacity(task, goal, DEFAULT_RECENT_THOUGHTS)
    }

    /// Create with a custom recent-thought window (at least 1)
    pub fn with_capacity(task: impl Into<String>, goal: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            task: task.into(),
            goal: goal.into(),
            key_findings: Vec::new(),
            recent_thoughts: VecDeque::with_capacity(capacity),
            accepted_thoughts: Vec::new(),
            recent_capacity: capacity,
            unresolved_questions: Vec::new(),
            feedback: Vec::new(),
            reflections: Vec::new(),
            observations: Vec::new(),
            confidence_scores: Vec::new(),
            mentioned_entities: Vec::new(),
            step_count: 0,
            entity_index: HashSet::new(),
            seen_thoughts: HashSet::new(),
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn key_findings(&self) -> &[String] {
        &self.key_findings
    }

    pub fn recent_thoughts(&self) -> &VecDeque<String> {
        &self.recent_thoughts
    }

    /// Every accepted thought, oldest first
    pub fn accepted_thoughts(&self) -> &[String] {
        &self.accepted_thoughts
    }

    pub fn unresolved_questions(&self) -> &[String] {
        &self.unresolved_questions
    }

    pub fn feedback(&self) -> &[String] {
        &self.feedback
    }

    pub fn latest_feedback(&self) -> Option<&str> {
        self.feedback.last().map(String::as_str)
    }

    pub fn reflections(&self) -> &[String] {
        &self.reflections
    }

    pub fn latest_reflection(&self) -> Option<&str> {
        self.reflections.last().map(String::as_str)
    }

    pub fn observations(&self) -> &[serde_json::Value] {
        &self.observations
    }

    pub fn confidence_scores(&self) -> &[f64] {
        &self.confidence_scores
    }

    /// Entities in first-seen order
    pub fn mentioned_entities(&self) -> &[String] {
        &self.mentioned_entities
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Record an accepted thought. Evicts the oldest when the window is full.
    pub fn add_thought(&mut self, thought: &str) {
        if thought.trim().is_empty() {
            return;
        }
        self.seen_thoughts.insert(normalize(thought));
        self.accepted_thoughts.push(thought.to_string());
        self.recent_thoughts.push_back(thought.to_string());
        while self.recent_thoughts.len() > self.recent_capacity {
            self.recent_thoughts.pop_front();
        }
    }

    /// Whether an equivalent thought (trimmed, case-insensitive) was accepted
    /// earlier in this session
    pub fn has_seen_thought(&self, thought: &str) -> bool {
        self.seen_thoughts.contains(&normalize(thought))
    }

    pub fn add_key_findings<I, S>(&mut self, findings: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        push_non_blank(&mut self.key_findings, findings);
    }

    pub fn add_unresolved_questions<I, S>(&mut self, questions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        push_non_blank(&mut self.unresolved_questions, questions);
    }

    pub fn add_feedback(&mut self, item: impl AsRef<str>) {
        push_non_blank(&mut self.feedback, [item]);
    }

    pub fn add_reflection(&mut self, reflection: impl AsRef<str>) {
        push_non_blank(&mut self.reflections, [reflection]);
    }

    pub fn add_observation(&mut self, observation: serde_json::Value) {
        if !observation.is_null() {
            self.observations.push(observation);
        }
    }

    pub fn add_confidence_score(&mut self, score: f64) {
        self.confidence_scores.push(score);
    }

    pub fn add_mentioned_entities<I, S>(&mut self, entities: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for entity in entities {
            let entity = entity.as_ref().trim();
            if entity.is_empty() {
                continue;
            }
            if self.entity_index.insert(entity.to_string()) {
                self.mentioned_entities.push(entity.to_string());
            }
        }
    }

    pub fn increment_step_count(&mut self) {
        self.step_count += 1;
    }
}

#[derive(Deserialize)]
struct ContextRepr {
    task: String,
    goal: String,
    #[serde(default)]
    key_findings: Vec<String>,
    #[serde(default)]
    recent_thoughts: VecDeque<String>,
    #[serde(default)]
    accepted_thoughts: Vec<String>,
    #[serde(default = "default_capacity")]
    recent_capacity: usize,
    #[serde(default)]
    unresolved_questions: Vec<String>,
    #[serde(default)]
    feedback: Vec<String>,
    #[serde(default)]
    reflections: Vec<String>,
    #[serde(default)]
    observations: Vec<serde_json::Value>,
    #[serde(default)]
    confidence_scores: Vec<f64>,
    #[serde(default)]
    mentioned_entities: Vec<String>,
    #[serde(default)]
    step_count: usize,
}

fn default_capacity() -> usize {
    DEFAULT_RECENT_THOUGHTS
}

impl From<ContextRepr> for ReasoningContext {
    fn from(repr: ContextRepr) -> Self {
        let mut context = Self::with_capacity(repr.task, repr.goal, repr.recent_capacity);
        context.key_findings = repr.key_findings;
        context.unresolved_questions = repr.unresolved_questions;
        context.feedback = repr.feedback;
        context.reflections = repr.reflections;
        context.observations = repr.observations;
        context.confidence_scores = repr.confidence_scores;
        context.step_count = repr.step_count;
        context.add_mentioned_entities(repr.mentioned_entities);

        context.seen_thoughts = repr
            .accepted_thoughts
            .iter()
            .chain(repr.recent_thoughts.iter())
            .map(|t| normalize(t))
            .collect();
        context.accepted_thoughts = repr.accepted_thoughts;
        context.recent_thoughts = repr.recent_thoughts;
        while context.recent_thoughts.len() > context.recent_capacity {
            context.recent_thoughts.pop_front();
        }
        context
    }
}

fn normalize(thought: &str) -> String {
    thought.trim().to_lowercase()
}

fn push_non_blank<I, S>(target: &mut Vec<String>, items: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    target.extend(
        items
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty()),
    );
}
