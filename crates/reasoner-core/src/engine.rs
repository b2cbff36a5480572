//! Reasoning Loop
//!
//! Drives one session through generate → validate → update → act →
//! reflect → check, for at most `max_iterations` cycles, then synthesizes
//! the final artifact from the accepted steps.
//!
//! ```text
//! INIT → GENERATE → VALIDATE ─┬─ REJECT ─────────────────────────────┐
//!                             └─ ACCEPT → UPDATE_CONTEXT → MAYBE_ACT │
//!                                 → MAYBE_REFLECT → CHECK_TERMINATION│
//!                                        │ stop          │ continue  │
//!                                        ▼               └─► GENERATE◄┘
//!                                   SYNTHESIZE → TERMINAL
//! ```
//!
//! Rejected steps still spend an iteration, so the worst case is bounded.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::config::{EngineConfig, FailurePolicy, PromptTemplates};
use crate::context::ReasoningContext;
use crate::dispatch::{ActionDispatcher, NoActions};
use crate::error::{ReasonerError, Result};
use crate::generator::{ContextSnapshot, StepGenerator};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::reflection::ReflectionScheduler;
use crate::session::{ReasoningOutcome, SessionId};
use crate::signals::{HeuristicExtractor, SignalExtractor};
use crate::stagnation::StagnationDetector;
use crate::step::{ReasoningStep, StepSchema};
use crate::synthesizer::{OutputSynthesizer, Synthesis};
use crate::termination::{TerminationPolicy, TerminationReason};
use crate::validator::StepValidator;

/// Loop states, traced at debug level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Init,
    Generate,
    Validate,
    Reject,
    Accept,
    UpdateContext,
    MaybeAct,
    MaybeReflect,
    CheckTermination,
    Synthesize,
    Terminal,
}

fn enter(state: LoopState) {
    tracing::debug!(?state, "Loop state");
}

/// What the loop accumulated before synthesis
struct LoopReport {
    steps: Vec<ReasoningStep>,
    rejected_steps: usize,
    failed_calls: usize,
    iterations: usize,
    generation_calls: usize,
    termination: TerminationReason,
}

/// Parameterized reasoning loop. One engine serves any number of
/// concurrent sessions; each session owns its context.
pub struct ReasoningEngine {
    config: EngineConfig,
    generator: StepGenerator,
    validator: StepValidator,
    extractor: Arc<dyn SignalExtractor>,
    termination: TerminationPolicy,
    dispatcher: Arc<dyn ActionDispatcher>,
    reflection: ReflectionScheduler,
    synthesizer: OutputSynthesizer,
}

impl ReasoningEngine {
    /// Create a new engine
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        dispatcher: Arc<dyn ActionDispatcher>,
        extractor: Arc<dyn SignalExtractor>,
        config: EngineConfig,
        templates: PromptTemplates,
        generation: GenerationOptions,
    ) -> Result<Self> {
        config.validate()?;

        let generator = StepGenerator::new(
            provider.clone(),
            generation.clone(),
            templates.reasoning,
            templates.continue_instruction,
            config.schema,
        );
        let reflection = ReflectionScheduler::new(
            provider.clone(),
            generation.clone(),
            templates.reflection,
            config.reflection_interval,
        );
        let synthesizer = OutputSynthesizer::new(
            provider,
            generation,
            templates.review,
            templates.synthesis,
            templates.synthesis_instructions,
        );
        let termination = TerminationPolicy::new(
            config.confidence_threshold,
            config.max_iterations,
            StagnationDetector::new(config.stagnation_window, config.diversity_cutoff),
        );

        Ok(Self {
            validator: StepValidator::new(config.min_words),
            config,
            generator,
            extractor,
            termination,
            dispatcher,
            reflection,
            synthesizer,
        })
    }

    pub fn builder() -> ReasoningEngineBuilder {
        ReasoningEngineBuilder::new()
    }

    /// Get configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fresh context sized for this engine
    pub fn new_context(&self, task: impl Into<String>, goal: impl Into<String>) -> ReasoningContext {
        ReasoningContext::with_capacity(task, goal, self.config.recent_thoughts)
    }

    /// Run a session whose artifact is decoded from JSON
    pub async fn run<T: DeserializeOwned>(
        &self,
        task: impl Into<String>,
        goal: impl Into<String>,
    ) -> Result<ReasoningOutcome<T>> {
        let mut context = self.new_context(task, goal);
        self.run_in(&mut context).await
    }

    /// Run a session whose artifact is free text
    pub async fn run_text(
        &self,
        task: impl Into<String>,
        goal: impl Into<String>,
    ) -> Result<ReasoningOutcome<String>> {
        let mut context = self.new_context(task, goal);
        self.run_text_in(&mut context).await
    }

    /// Run against a caller-owned context. On error the context keeps
    /// whatever the session accumulated.
    pub async fn run_in<T: DeserializeOwned>(
        &self,
        context: &mut ReasoningContext,
    ) -> Result<ReasoningOutcome<T>> {
        let session_id = SessionId::new();
        let span = tracing::info_span!("reasoning_session", session_id = %session_id, task = %context.task());

        async {
            let started_at = Utc::now();
            let report = self.reason(context).await?;

            enter(LoopState::Synthesize);
            let synthesis = self.synthesizer.synthesize::<T>(&report.steps, context).await?;
            Ok::<_, ReasonerError>(Self::finish(session_id.clone(), synthesis, report, context, started_at))
        }
        .instrument(span)
        .await
    }

    /// Text-artifact variant of [`run_in`](Self::run_in)
    pub async fn run_text_in(&self, context: &mut ReasoningContext) -> Result<ReasoningOutcome<String>> {
        let session_id = SessionId::new();
        let span = tracing::info_span!("reasoning_session", session_id = %session_id, task = %context.task());

        async {
            let started_at = Utc::now();
            let report = self.reason(context).await?;

            enter(LoopState::Synthesize);
            let synthesis = self.synthesizer.synthesize_text(&report.steps, context).await?;
            Ok::<_, ReasonerError>(Self::finish(session_id.clone(), synthesis, report, context, started_at))
        }
        .instrument(span)
        .await
    }

    fn finish<T>(
        session_id: SessionId,
        synthesis: Synthesis<T>,
        report: LoopReport,
        context: &ReasoningContext,
        started_at: chrono::DateTime<Utc>,
    ) -> ReasoningOutcome<T> {
        enter(LoopState::Terminal);
        tracing::info!(
            iterations = report.iterations,
            accepted = report.steps.len(),
            rejected = report.rejected_steps,
            termination = %report.termination,
            "Reasoning session finished"
        );

        ReasoningOutcome {
            session_id,
            artifact: synthesis.artifact,
            trace: synthesis.trace,
            reviewed: synthesis.reviewed,
            steps: report.steps,
            rejected_steps: report.rejected_steps,
            failed_calls: report.failed_calls,
            iterations: report.iterations,
            generation_calls: report.generation_calls,
            termination: report.termination,
            context: context.clone(),
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// The bounded loop
    async fn reason(&self, context: &mut ReasoningContext) -> Result<LoopReport> {
        enter(LoopState::Init);

        let actions = self.dispatcher.describe();
        let mut report = LoopReport {
            steps: Vec::new(),
            rejected_steps: 0,
            failed_calls: 0,
            iterations: 0,
            generation_calls: 0,
            termination: TerminationReason::MaxIterations,
        };

        for iteration in 1..=self.config.max_iterations {
            report.iterations = iteration;
            tracing::info!(iteration, "=== Reasoning Cycle ===");

            enter(LoopState::Generate);
            let snapshot = ContextSnapshot::capture(context, actions.clone());
            report.generation_calls += 1;
            let generated = match self.generator.generate(&snapshot).await {
                Ok(step) => Some(step),
                Err(ReasonerError::Decode(_)) => None,
                Err(e) => {
                    self.absorb_failure(e, context)?;
                    report.failed_calls += 1;
                    continue;
                }
            };

            enter(LoopState::Validate);
            let validation = self.validator.validate(generated.as_ref(), context);
            let step = match generated {
                Some(step) if validation.valid => step,
                _ => {
                    enter(LoopState::Reject);
                    let error = validation.error.unwrap_or_else(|| "Step rejected".into());
                    tracing::warn!(iteration, %error, "Reasoning validation failed");
                    context.add_feedback(&error);
                    report.rejected_steps += 1;
                    continue;
                }
            };

            enter(LoopState::Accept);
            tracing::info!(
                iteration,
                thought = %step.thought,
                confidence = ?step.confidence,
                action_needed = step.action_needed,
                "Step accepted"
            );
            if !validation.suggestions.is_empty() {
                context.add_feedback(validation.suggestions.join("; "));
            }

            enter(LoopState::UpdateContext);
            self.update_context(context, &step);

            enter(LoopState::MaybeAct);
            if let Some(request) = step.action_request.as_ref().filter(|_| step.action_needed) {
                match self.dispatcher.dispatch(request).await {
                    Ok(observation) => {
                        tracing::info!(%observation, "Executed action, received observation");
                        context.add_observation(observation);
                    }
                    Err(e) => {
                        let message = e.to_string();
                        self.absorb_failure(e, context)?;
                        report.failed_calls += 1;
                        context.add_observation(serde_json::json!({
                            "success": false,
                            "error": message,
                        }));
                    }
                }
            }

            report.steps.push(step);

            enter(LoopState::MaybeReflect);
            if self.reflection.is_due(iteration) {
                match self.reflection.reflect(&report.steps, context).await {
                    Ok(reflection) => {
                        tracing::debug!(%reflection, "Reflection added");
                        context.add_reflection(reflection);
                    }
                    Err(e) => {
                        self.absorb_failure(e, context)?;
                        report.failed_calls += 1;
                    }
                }
            }

            enter(LoopState::CheckTermination);
            let decision = report
                .steps
                .last()
                .and_then(|latest| self.termination.evaluate(latest, context, iteration));
            if let Some(reason) = decision {
                tracing::info!(iteration, %reason, "Terminating reasoning");
                report.termination = reason;
                break;
            }
        }

        Ok(report)
    }

    fn update_context(&self, context: &mut ReasoningContext, step: &ReasoningStep) {
        context.add_thought(&step.thought);
        context.increment_step_count();
        context.add_key_findings(&step.key_findings);
        context.add_unresolved_questions(self.extractor.questions(&step.thought));
        if let Some(confidence) = step.confidence {
            context.add_confidence_score(confidence);
        }
        context.add_mentioned_entities(self.extractor.entities(&step.thought));
    }

    /// Apply the failure policy to an external error. Returns the error
    /// when the session must abort.
    fn absorb_failure(&self, error: ReasonerError, context: &mut ReasoningContext) -> Result<()> {
        if !error.is_external() || self.config.failure_policy == FailurePolicy::FailFast {
            tracing::error!(%error, "Reasoning session aborted");
            return Err(error);
        }

        tracing::warn!(%error, "External call failed, continuing");
        context.add_feedback(format!("Previous attempt failed: {}", error));
        Ok(())
    }
}

/// Builder for a reasoning engine
pub struct ReasoningEngineBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    dispatcher: Arc<dyn ActionDispatcher>,
    extractor: Arc<dyn SignalExtractor>,
    config: EngineConfig,
    templates: PromptTemplates,
    generation: GenerationOptions,
}

impl Default for ReasoningEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReasoningEngineBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            dispatcher: Arc::new(NoActions),
            extractor: Arc::new(HeuristicExtractor::new()),
            config: EngineConfig::default(),
            templates: PromptTemplates::default(),
            generation: GenerationOptions::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn ActionDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn SignalExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn generation(mut self, generation: GenerationOptions) -> Self {
        self.generation = generation;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.generation.temperature = temp;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn schema(mut self, schema: StepSchema) -> Self {
        self.config.schema = schema;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn build(self) -> Result<ReasoningEngine> {
        let provider = self
            .provider
            .ok_or_else(|| ReasonerError::Config("Provider is required".into()))?;

        ReasoningEngine::new(
            provider,
            self.dispatcher,
            self.extractor,
            self.config,
            self.templates,
            self.generation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        step_json, test_templates, thought, RecordingDispatcher, ScriptedProvider,
    };
    use serde_json::json;

    fn engine(provider: Arc<ScriptedProvider>) -> ReasoningEngine {
        ReasoningEngine::builder()
            .provider(provider)
            .templates(test_templates())
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_provider() {
        let err = ReasoningEngine::builder().build().err().unwrap();
        assert!(matches!(err, ReasonerError::Config(_)));
    }

    #[test]
    fn test_builder_validates_config() {
        let err = ReasoningEngine::builder()
            .provider(Arc::new(ScriptedProvider::new()))
            .max_iterations(0)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ReasonerError::Config(_)));
    }

    #[tokio::test]
    async fn test_done_step_terminates_immediately() {
        let provider = Arc::new(ScriptedProvider::new().step(step_json(&thought(1), true, Some(0.1))));
        let outcome = engine(provider.clone()).run_text("task", "goal").await.unwrap();

        assert_eq!(outcome.termination, TerminationReason::Done);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.steps.len(), 1);
        assert!(!outcome.reviewed);
        assert!(!outcome.trace.contains("Review:"));
        assert_eq!(provider.step_calls(), 1);
        assert_eq!(provider.review_calls(), 0);
        assert_eq!(provider.synthesis_calls(), 1);
        assert_eq!(outcome.artifact, "final artifact");
        assert!(outcome.completed());
        assert!(outcome.finished_at >= outcome.started_at);
    }

    #[tokio::test]
    async fn test_confident_step_terminates_early() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .step(step_json(&thought(1), false, Some(0.3)))
                .step(step_json(&thought(2), false, Some(0.85))),
        );
        let outcome = engine(provider.clone()).run_text("task", "goal").await.unwrap();

        assert_eq!(outcome.termination, TerminationReason::Confident);
        assert_eq!(outcome.iterations, 2);
        assert!(outcome.reviewed);
        assert!(outcome.trace.contains("Review:"));
        assert!(!outcome.completed());
    }

    #[tokio::test]
    async fn test_budget_bounds_generation_calls() {
        let mut provider = ScriptedProvider::new();
        for i in 1..=15 {
            provider = provider.step(step_json(&thought(i), false, Some(0.2)));
        }
        let provider = Arc::new(provider);
        let outcome = engine(provider.clone()).run_text("task", "goal").await.unwrap();

        assert_eq!(outcome.termination, TerminationReason::MaxIterations);
        assert_eq!(outcome.iterations, 10);
        assert_eq!(provider.step_calls(), 10);
        assert_eq!(outcome.generation_calls, 10);
        assert_eq!(outcome.steps.len(), 10);
        assert!(outcome.context.recent_thoughts().len() <= 5);
        assert!(outcome.trace.contains("Review:"));
    }

    #[tokio::test]
    async fn test_rejections_consume_iterations() {
        let mut provider = ScriptedProvider::new();
        for _ in 0..12 {
            provider = provider.step(step_json("far too short", false, Some(0.9)));
        }
        let provider = Arc::new(provider);
        let outcome = engine(provider.clone()).run_text("task", "goal").await.unwrap();

        assert_eq!(provider.step_calls(), 10);
        assert!(outcome.steps.is_empty());
        assert_eq!(outcome.rejected_steps, 10);
        assert_eq!(outcome.termination, TerminationReason::MaxIterations);
        assert!(outcome.trace.starts_with("No valid reasoning steps"));
        assert!(outcome.context.latest_feedback().unwrap().contains("too brief"));
    }

    #[tokio::test]
    async fn test_duplicate_thoughts_never_accepted() {
        let repeated = thought(7);
        let provider = Arc::new(
            ScriptedProvider::new()
                .step(step_json(&repeated, false, Some(0.2)))
                .step(step_json(&repeated.to_uppercase(), false, Some(0.2)))
                .step(step_json(&format!("  {}  ", repeated), false, Some(0.2)))
                .step(step_json(&thought(8), true, None)),
        );
        let outcome = engine(provider).run_text("task", "goal").await.unwrap();

        assert_eq!(outcome.steps.len(), 2);
        assert_eq!(outcome.rejected_steps, 2);
        assert_eq!(outcome.iterations, 4);
        let mut normalized: Vec<String> = outcome
            .steps
            .iter()
            .map(|s| s.thought.trim().to_lowercase())
            .collect();
        normalized.dedup();
        assert_eq!(normalized.len(), outcome.steps.len());
        assert!(outcome.steps.iter().all(|s| s.word_count() >= 15));
    }

    #[tokio::test]
    async fn test_decode_failure_is_rejection() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .step("not json at all")
                .step(step_json(&thought(1), true, None)),
        );
        let outcome = engine(provider).run_text("task", "goal").await.unwrap();

        assert_eq!(outcome.rejected_steps, 1);
        assert_eq!(outcome.steps.len(), 1);
        assert_eq!(outcome.context.feedback()[0], "Step could not be decoded");
    }

    #[tokio::test]
    async fn test_stagnation_terminates() {
        let stale = "the plan is the plan and the plan stays the plan until the plan is the plan again";
        let provider = Arc::new(
            ScriptedProvider::new()
                .step(step_json(stale, false, Some(0.2)))
                .step(step_json(&format!("{} yes", stale), false, Some(0.2)))
                .step(step_json(&format!("{} yes yes", stale), false, Some(0.2))),
        );
        let outcome = engine(provider).run_text("task", "goal").await.unwrap();

        assert_eq!(outcome.termination, TerminationReason::Stagnant);
        assert_eq!(outcome.iterations, 3);
    }

    #[tokio::test]
    async fn test_context_updated_from_step() {
        let text = "John Smith met Jane Doe in Paris and we still need to confirm the exact dates of every meeting they had";
        let provider = Arc::new(
            ScriptedProvider::new().step(
                json!({
                    "thought": text,
                    "done": true,
                    "confidence": 0.6,
                    "key_findings": ["met in Paris", " "]
                })
                .to_string(),
            ),
        );
        let outcome = engine(provider).run_text("task", "goal").await.unwrap();
        let ctx = &outcome.context;

        assert_eq!(ctx.step_count(), 1);
        assert_eq!(ctx.key_findings(), &["met in Paris"]);
        assert_eq!(ctx.unresolved_questions(), &["What information is missing?"]);
        assert_eq!(ctx.confidence_scores(), &[0.6]);
        assert_eq!(ctx.mentioned_entities(), &["John Smith", "Jane Doe", "Paris"]);
    }

    #[tokio::test]
    async fn test_action_dispatched_and_observed() {
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let provider = Arc::new(
            ScriptedProvider::new()
                .step(
                    json!({
                        "thought": thought(1),
                        "action_needed": true,
                        "action_request": {"tool": "search", "arguments": {"q": "films"}},
                        "done": false
                    })
                    .to_string(),
                )
                .step(step_json(&thought(2), true, None))
                .synthesis(r#"{"films": ["One"]}"#),
        );
        let engine = ReasoningEngine::builder()
            .provider(provider.clone())
            .dispatcher(dispatcher.clone())
            .templates(test_templates())
            .build()
            .unwrap();

        let outcome: ReasoningOutcome<serde_json::Value> = engine.run("task", "goal").await.unwrap();

        assert_eq!(dispatcher.requests().len(), 1);
        assert_eq!(outcome.context.observations().len(), 1);
        assert_eq!(outcome.context.observations()[0]["echo"]["tool"], "search");
        assert!(provider.step_prompts()[0].system.contains("- search: Search things"));
        assert!(outcome.trace.contains(&thought(1)));
        assert_eq!(outcome.artifact["films"][0], "One");
    }

    #[tokio::test]
    async fn test_reflection_every_third_iteration() {
        let mut provider = ScriptedProvider::new().reflection("Narrow the search.");
        for i in 1..=7 {
            provider = provider.step(step_json(&thought(i), i == 7, Some(0.2)));
        }
        let provider = Arc::new(provider);
        let outcome = engine(provider.clone()).run_text("task", "goal").await.unwrap();

        assert_eq!(outcome.iterations, 7);
        assert_eq!(provider.reflection_calls(), 2);
        assert_eq!(outcome.context.reflections().len(), 2);
        assert!(provider.step_prompts()[3].system.contains("Latest Reflection: Narrow the search."));
        assert_eq!(outcome.termination, TerminationReason::Done);
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_with_partial_context() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .step(step_json(&thought(1), false, Some(0.2)))
                .step_error("connection reset"),
        );
        let engine = engine(provider.clone());
        let mut context = engine.new_context("task", "goal");

        let err = engine.run_text_in(&mut context).await.unwrap_err();
        assert!(matches!(err, ReasonerError::Provider(_)));
        assert_eq!(context.step_count(), 1);
        assert_eq!(provider.synthesis_calls(), 0);
    }

    #[tokio::test]
    async fn test_resilient_policy_continues() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .step_error("connection reset")
                .step(step_json(&thought(1), true, None)),
        );
        let engine = ReasoningEngine::builder()
            .provider(provider.clone())
            .templates(test_templates())
            .failure_policy(FailurePolicy::Resilient)
            .build()
            .unwrap();

        let outcome = engine.run_text("task", "goal").await.unwrap();
        assert_eq!(outcome.failed_calls, 1);
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.steps.len(), 1);
        assert!(outcome.context.feedback()[0].contains("connection reset"));
    }

    #[tokio::test]
    async fn test_resilient_action_failure_recorded() {
        let dispatcher = Arc::new(RecordingDispatcher::failing());
        let provider = Arc::new(
            ScriptedProvider::new().step(
                json!({
                    "thought": thought(1),
                    "action_needed": true,
                    "action_request": {"tool": "search"},
                    "done": true
                })
                .to_string(),
            ),
        );
        let engine = ReasoningEngine::builder()
            .provider(provider)
            .dispatcher(dispatcher)
            .templates(test_templates())
            .failure_policy(FailurePolicy::Resilient)
            .build()
            .unwrap();

        let outcome = engine.run_text("task", "goal").await.unwrap();
        assert_eq!(outcome.failed_calls, 1);
        assert_eq!(outcome.context.observations()[0]["success"], false);
    }

    #[tokio::test]
    async fn test_tool_errors_become_observations_under_fail_fast() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .step(
                    json!({
                        "thought": thought(1),
                        "action_needed": true,
                        "action_request": {"tool": "missing_tool"},
                        "done": false
                    })
                    .to_string(),
                )
                .step(step_json(&thought(2), true, None)),
        );
        let engine = ReasoningEngine::builder()
            .provider(provider)
            .dispatcher(Arc::new(crate::tool::ToolRegistry::new()))
            .templates(test_templates())
            .failure_policy(FailurePolicy::FailFast)
            .build()
            .unwrap();

        let outcome = engine.run_text("task", "goal").await.unwrap();
        assert_eq!(outcome.failed_calls, 0);
        assert_eq!(outcome.steps.len(), 2);
        assert_eq!(outcome.context.observations()[0]["success"], false);
    }

    #[tokio::test]
    async fn test_reduced_schema_session() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .step(r#"{"thought": "short", "done": false}"#)
                .step(step_json(&thought(1), true, None)),
        );
        let engine = ReasoningEngine::builder()
            .provider(provider.clone())
            .templates(test_templates())
            .schema(StepSchema::Reduced)
            .build()
            .unwrap();

        let outcome = engine.run_text("close for issue PM-1", "Execute the operation").await.unwrap();
        assert_eq!(outcome.steps.len(), 1);
        assert!(provider.step_prompts()[0].user.contains("Start planning: close for issue PM-1"));
    }

    #[tokio::test]
    async fn test_concurrent_sessions_are_isolated() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .step(step_json(&thought(1), true, None))
                .step(step_json(&thought(2), true, None)),
        );
        let engine = engine(provider.clone());

        let (a, b) = tokio::join!(engine.run_text("task a", "goal"), engine.run_text("task b", "goal"));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a.context.step_count(), 1);
        assert_eq!(b.context.step_count(), 1);
        assert_eq!(a.context.task(), "task a");
        assert_eq!(b.context.task(), "task b");
        assert_eq!(provider.step_calls(), 2);
    }
}
