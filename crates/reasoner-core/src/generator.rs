//! Step Generation
//!
//! Renders the session state into a prompt, makes one provider call and
//! decodes the reply into a `ReasoningStep`.

use std::sync::Arc;

use crate::context::ReasoningContext;
use crate::dispatch::{render_actions, ActionDescriptor};
use crate::error::Result;
use crate::message::{bracket_list, Prompt};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::step::{ReasoningStep, StepSchema};

const TOP_FINDINGS: usize = 3;

/// What the next step should concentrate on, derived from the most recent
/// unresolved question
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusArea {
    SynthesizeFindings,
    ResearchFilms,
    EstablishTimeline,
    Categorize,
    GeneralResearch,
}

impl FocusArea {
    pub fn from_questions(questions: &[String]) -> Self {
        let Some(latest) = questions.last() else {
            return FocusArea::SynthesizeFindings;
        };

        let latest = latest.to_lowercase();
        if latest.contains("film") {
            FocusArea::ResearchFilms
        } else if latest.contains("year") || latest.contains("time") {
            FocusArea::EstablishTimeline
        } else if latest.contains("category") || latest.contains("type") {
            FocusArea::Categorize
        } else {
            FocusArea::GeneralResearch
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FocusArea::SynthesizeFindings => "synthesize findings",
            FocusArea::ResearchFilms => "research films/roles",
            FocusArea::EstablishTimeline => "establish timeline",
            FocusArea::Categorize => "categorize",
            FocusArea::GeneralResearch => "general research",
        }
    }
}

impl std::fmt::Display for FocusArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Read-only view of the context used to build one step prompt
#[derive(Clone, Debug)]
pub struct ContextSnapshot {
    pub task: String,
    pub goal: String,
    pub step_count: usize,
    pub top_findings: Vec<String>,
    pub unresolved_questions: Vec<String>,
    pub latest_feedback: Option<String>,
    pub latest_reflection: Option<String>,
    pub previous_thought: String,
    pub thought_trail: Vec<String>,
    pub actions: Vec<ActionDescriptor>,
    pub focus: FocusArea,
}

impl ContextSnapshot {
    pub fn capture(context: &ReasoningContext, actions: Vec<ActionDescriptor>) -> Self {
        let thought_trail = context.accepted_thoughts().to_vec();
        let previous_thought = thought_trail
            .last()
            .cloned()
            .unwrap_or_else(|| format!("Start planning: {}", context.task()));

        Self {
            task: context.task().to_string(),
            goal: context.goal().to_string(),
            step_count: context.step_count(),
            top_findings: context.key_findings().iter().take(TOP_FINDINGS).cloned().collect(),
            unresolved_questions: context.unresolved_questions().to_vec(),
            latest_feedback: context.latest_feedback().map(str::to_string),
            latest_reflection: context.latest_reflection().map(str::to_string),
            previous_thought,
            thought_trail,
            actions,
            focus: FocusArea::from_questions(context.unresolved_questions()),
        }
    }
}

/// Produces the next reasoning step
pub struct StepGenerator {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    preamble: String,
    continue_instruction: String,
    schema: StepSchema,
}

impl StepGenerator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        options: GenerationOptions,
        preamble: impl Into<String>,
        continue_instruction: impl Into<String>,
        schema: StepSchema,
    ) -> Self {
        Self {
            provider,
            options: options.json(),
            preamble: preamble.into(),
            continue_instruction: continue_instruction.into(),
            schema,
        }
    }

    pub fn schema(&self) -> StepSchema {
        self.schema
    }

    pub fn build_prompt(&self, snapshot: &ContextSnapshot) -> Prompt {
        let mut system = format!(
            "{}\n\n{}\n\nCurrent Context:\nTask: {}\nGoal: {}\nPrevious Steps: {}\nKey Findings So Far: {}\nRemaining Questions: {}\nFeedback: {}\n",
            self.preamble,
            self.schema.format_instructions(),
            snapshot.task,
            snapshot.goal,
            snapshot.step_count,
            bracket_list(&snapshot.top_findings),
            bracket_list(&snapshot.unresolved_questions),
            snapshot.latest_feedback.as_deref().unwrap_or("None"),
        );

        if let Some(reflection) = &snapshot.latest_reflection {
            system.push_str(&format!("Latest Reflection: {}\n", reflection));
        }
        if self.schema == StepSchema::Full {
            system.push_str(&render_actions(&snapshot.actions));
            system.push('\n');
        }
        system.push_str(&format!(
            "\nGenerate next reasoning step focusing on: {}",
            snapshot.focus
        ));

        let user = format!(
            "Previous thought: {}\n\nPrevious reasoning steps: {}\n\n{}",
            snapshot.previous_thought,
            snapshot.thought_trail.join(" -> "),
            self.continue_instruction,
        );

        Prompt::new(system, user)
    }

    /// One provider call. Undecodable replies surface as
    /// `ReasonerError::Decode`; transport failures pass through unchanged.
    pub async fn generate(&self, snapshot: &ContextSnapshot) -> Result<ReasoningStep> {
        let prompt = self.build_prompt(snapshot);
        let completion = self.provider.complete_prompt(&prompt, &self.options).await?;

        ReasoningStep::decode(&completion.content, self.schema).inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to decode reasoning step");
        })
    }
}
