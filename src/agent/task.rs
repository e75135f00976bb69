//! Agent Loop (C6) and Trial Controller (C7).
//!
//! Grounded on `original_source/task.py`: the outer `_initiate_task_loop`
//! while-loop with a consecutive-mistakes guard, wrapped by
//! `execute_with_trials`'s retry-with-preserved-learning trial loop. The
//! teacher's `agentic_loop.rs`/`state_machine.rs` contributed the async
//! callback/enum-outcome idiom this is written in, but their three-phase
//! plan/execute/reflect split is not used — a trial here is one linear
//! iterate-until-done cycle, matching `task.py`.

use crate::agent::conversation::Conversation;
use crate::agent::prompts::PromptBuilder;
use crate::agent::reflection::{ReflectionManager, ReflectionMode, ReflectionTrigger};
use crate::agent::types::{ContentBlock, Message, MessageContent};
use crate::error::Result;
use crate::llm::LlmProvider;
use crate::tools::registry::ATTEMPT_COMPLETION;
use crate::tools::{ToolExecutionResult, ToolRegistry};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// How often (in iterations) a periodic reflection fires, absent any other
/// trigger — mirrors `task.py`'s fixed check-every-N-iterations cadence.
const PERIODIC_REFLECTION_INTERVAL: u32 = 5;

/// How many consecutive tool errors the inner loop tolerates before
/// aborting the trial outright (§3's `max_consecutive_mistakes`, default 3).
const MAX_CONSECUTIVE_MISTAKES: u32 = 3;

/// How many consecutive assistant responses with no `tool_use` blocks the
/// inner loop tolerates before aborting outright (P6: five consecutive
/// empty-of-tool-uses responses terminate the trial, four do not) — a
/// separate counter from `MAX_CONSECUTIVE_MISTAKES`, since a model that
/// keeps talking instead of acting is a distinct failure mode from one that
/// keeps calling tools that error out.
const MAX_CONSECUTIVE_EMPTY_RESPONSES: u32 = 5;

/// Substrings in a pre-completion reflection's insight that mean the agent
/// is about to call `attempt_completion` on unfinished work.
const INCOMPLETE_INDICATORS: &[&str] = &[
    "incomplete", "missing", "not created", "haven't", "did not", "didn't",
    "should have", "need to", "required but", "not all", "partially",
];

/// Substrings in `run_validation`'s textual output that count as a pass,
/// independent of the tool result's structural `is_error` flag.
const VALIDATION_PASS_INDICATORS: &[&str] = &["passed", "success", "skipped"];

/// `status` (§3): where the task currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Aborted,
}

/// Mutable state tracked across the inner loop (§3's task context) and, for
/// every field but `trial_number`, reset at the start of each trial (§4.7).
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub status: TaskStatus,
    pub iteration_count: u32,
    pub consecutive_mistakes: u32,
    pub consecutive_empty_responses: u32,
    pub files_accessed: HashSet<String>,
    pub files_modified: HashSet<String>,
    pub branch_name: Option<String>,
    pub pr_url: Option<String>,
    pub tools_used_count: HashMap<String, u32>,
    pub validation_performed: bool,
    pub validation_passed: bool,
    pub last_validation_iteration: Option<u32>,
    pub last_reflection_iteration: Option<u32>,
    pub trial_number: u32,
    pub abort_requested: bool,
}

impl TaskContext {
    fn new(trial_number: u32) -> Self {
        TaskContext {
            status: TaskStatus::Pending,
            iteration_count: 0,
            consecutive_mistakes: 0,
            consecutive_empty_responses: 0,
            files_accessed: HashSet::new(),
            files_modified: HashSet::new(),
            branch_name: None,
            pr_url: None,
            tools_used_count: HashMap::new(),
            validation_performed: false,
            validation_passed: false,
            last_validation_iteration: None,
            last_reflection_iteration: None,
            trial_number,
            abort_requested: false,
        }
    }

    fn files_modified_json(&self) -> Value {
        Value::Array(self.files_modified.iter().cloned().map(Value::String).collect())
    }

    fn files_accessed_json(&self) -> Value {
        Value::Array(self.files_accessed.iter().cloned().map(Value::String).collect())
    }

    fn tools_used_json(&self) -> Value {
        json!(self.tools_used_count)
    }

    /// Invariant I-T1: any file-modifying tool resets both validation flags.
    fn reset_validation_if_performed(&mut self) {
        if self.validation_performed {
            self.validation_performed = false;
            self.validation_passed = false;
        }
    }
}

/// Outcome of a single trial (one pass through the inner loop to either
/// `attempt_completion` or exhaustion).
#[derive(Debug)]
pub enum TrialOutcome {
    /// The agent called `attempt_completion` with a summary that passed the
    /// incomplete-indicators check and had a prior passing validation run.
    Completed { summary: String },
    /// The inner loop ran out of iterations without completing.
    Exhausted,
    /// Too many consecutive mistakes (tool errors) or empty responses.
    AbortedOnMistakes,
}

/// Final result of `execute`/`execute_with_trials`: either the trial that
/// succeeded, or exhaustion of every allotted trial.
#[derive(Debug)]
pub enum TaskOutcome {
    Success { summary: String, trial: u32 },
    AllTrialsFailed { trials_run: u32 },
}

/// Drives one issue-to-PR task: owns the conversation, the tool registry,
/// and the reflection manager across as many trials as configured.
pub struct AgentTask {
    llm: Arc<dyn LlmProvider>,
    tools: ToolRegistry,
    reflection: ReflectionManager,
    max_iterations: u32,
    temperature: f32,
    max_tokens: u32,
    repo_identifier: String,
    issue_identifier: String,
    context: TaskContext,
}

impl AgentTask {
    pub fn new(llm: Arc<dyn LlmProvider>, tools: ToolRegistry, reflection: ReflectionManager) -> Self {
        AgentTask {
            llm,
            tools,
            reflection,
            max_iterations: 25,
            temperature: 0.2,
            max_tokens: 4096,
            repo_identifier: String::new(),
            issue_identifier: String::new(),
            context: TaskContext::new(1),
        }
    }

    pub fn with_max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    /// Names this run for the task-context section of the system prompt
    /// (§4.6 step 3: "repo, issue, current branch, iteration/max").
    pub fn with_task_identity(mut self, repo_identifier: impl Into<String>, issue_identifier: impl Into<String>) -> Self {
        self.repo_identifier = repo_identifier.into();
        self.issue_identifier = issue_identifier.into();
        self
    }

    /// Top-level entry point (§4.6): selects a mode and dispatches. Reflection
    /// disabled is equivalent to `within_task` except every `reflection.trigger`
    /// call is already a no-op (the manager checks `config.enabled` itself).
    pub async fn execute(&mut self, initial_prompt: &str, max_trials: u32) -> TaskOutcome {
        if !self.reflection.config.enabled {
            return self.execute_within_task(initial_prompt).await;
        }
        match self.reflection.config.mode {
            ReflectionMode::WithinTask => self.execute_within_task(initial_prompt).await,
            ReflectionMode::MultiTrial => self.execute_with_trials(initial_prompt, max_trials).await,
            ReflectionMode::Hybrid => {
                let outcome = self.execute_within_task(initial_prompt).await;
                match outcome {
                    TaskOutcome::Success { .. } => outcome,
                    TaskOutcome::AllTrialsFailed { .. } => {
                        self.execute_with_trials(initial_prompt, max_trials).await
                    }
                }
            }
        }
    }

    /// Single inner-loop pass, no trial controller: trial number is fixed at 1.
    async fn execute_within_task(&mut self, initial_prompt: &str) -> TaskOutcome {
        let mut conversation = Conversation::new();
        conversation.push_user_text(initial_prompt.to_string());
        self.context = TaskContext::new(1);
        self.context.status = TaskStatus::InProgress;

        match self.run_trial(&mut conversation, 1).await {
            TrialOutcome::Completed { summary } => TaskOutcome::Success { summary, trial: 1 },
            _ => TaskOutcome::AllTrialsFailed { trials_run: 1 },
        }
    }

    /// Run up to `max_trials` trials of the issue description, each seeded
    /// with a banner summarizing lessons from the prior trial's reflection
    /// when retrying (§4.7's preserved-learning requirement).
    pub async fn execute_with_trials(&mut self, issue_body: &str, max_trials: u32) -> TaskOutcome {
        let mut trial = 0;
        loop {
            trial += 1;
            let seed = if trial == 1 {
                issue_body.to_string()
            } else {
                format!(
                    "{}\n\n---\nThis is retry attempt {trial}. Lessons from the previous attempt:\n{}",
                    issue_body,
                    self.reflection.memory.format_for_prompt()
                )
            };

            let mut conversation = Conversation::new();
            conversation.push_user_text(seed);
            self.reset_for_next_trial(trial);

            match self.run_trial(&mut conversation, trial).await {
                TrialOutcome::Completed { summary } => {
                    return TaskOutcome::Success { summary, trial };
                }
                outcome => {
                    warn!("Trial {trial} ended without completion: {outcome:?}");
                    if self.reflection.trigger_enabled_for_trial_failure() {
                        let context = json!({
                            "trial_number": trial,
                            "iterations_used": self.context.iteration_count,
                            "abort_reason": format!("{outcome:?}"),
                            "completion_attempted": matches!(outcome, TrialOutcome::Completed { .. }),
                            "files_modified": self.context.files_modified_json(),
                            "validation_performed": self.context.validation_performed,
                            "validation_passed": self.context.validation_passed,
                            "tools_used": self.context.tools_used_json(),
                        });
                        self.reflection
                            .trigger(ReflectionTrigger::TrialFailure, context, &conversation, trial)
                            .await;
                    }
                    if trial >= max_trials {
                        return TaskOutcome::AllTrialsFailed { trials_run: trial };
                    }
                }
            }
        }
    }

    /// KEEP reflection memory and config across trials; RESET everything
    /// else that is trial-scoped. The conversation itself is rebuilt fresh
    /// by the caller.
    fn reset_for_next_trial(&mut self, trial: u32) {
        self.context = TaskContext::new(trial);
        self.context.status = TaskStatus::InProgress;
    }

    /// Inner loop: one request/response/tool-dispatch cycle per iteration,
    /// until `attempt_completion` is accepted, iterations are exhausted, or
    /// too many consecutive mistakes/empty responses accumulate.
    async fn run_trial(&mut self, conversation: &mut Conversation, trial: u32) -> TrialOutcome {
        for iteration in 1..=self.max_iterations {
            self.context.iteration_count = iteration;

            if iteration % PERIODIC_REFLECTION_INTERVAL == 0 {
                let context = json!({
                    "iteration": iteration,
                    "files_accessed": self.context.files_accessed_json(),
                    "files_modified": self.context.files_modified_json(),
                    "validation_performed": self.context.validation_performed,
                    "validation_passed": self.context.validation_passed,
                    "tools_used": self.context.tools_used_json(),
                });
                self.context.last_reflection_iteration = Some(iteration);
                self.reflection
                    .trigger(ReflectionTrigger::Periodic, context, conversation, iteration)
                    .await;
            }

            let system_prompt = self.build_system_prompt();
            let tool_defs = self.tools.definitions();
            let response = match self
                .llm
                .create_message(&system_prompt, conversation.messages(), Some(tool_defs.as_slice()), self.temperature, self.max_tokens)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!("LLM call failed on iteration {iteration}: {e}");
                    self.context.consecutive_mistakes += 1;
                    if self.context.consecutive_mistakes >= MAX_CONSECUTIVE_MISTAKES {
                        self.context.status = TaskStatus::Aborted;
                        return TrialOutcome::AbortedOnMistakes;
                    }
                    continue;
                }
            };

            conversation.push_assistant(Message::assistant(response.content.clone()));

            let tool_uses = response.content.tool_uses();
            if tool_uses.is_empty() {
                self.context.consecutive_empty_responses += 1;
                if self.context.consecutive_empty_responses >= MAX_CONSECUTIVE_EMPTY_RESPONSES {
                    self.context.status = TaskStatus::Aborted;
                    return TrialOutcome::AbortedOnMistakes;
                }
                // Plain-text turn with no tool call: nudge it forward next
                // iteration rather than ending the trial silently.
                conversation.push_user_text("Continue working the issue, or call a tool.");
                continue;
            }
            self.context.consecutive_empty_responses = 0;

            if let Some((id, _, input)) = tool_uses.iter().find(|(_, name, _)| *name == ATTEMPT_COMPLETION) {
                let summary = input.get("summary").and_then(|v| v.as_str()).unwrap_or("").to_string();
                match self.handle_attempt_completion(&summary, conversation, iteration).await {
                    Some(outcome) => return outcome,
                    None => {
                        // Rejected: tell the model why via a synthetic tool
                        // result so it can address the gap and retry.
                        let rejection = self.rejection_reason(&summary);
                        conversation.push_tool_results(vec![ContentBlock::tool_result(id.to_string(), rejection, true)]);
                        continue;
                    }
                }
            }

            let mut results = Vec::with_capacity(tool_uses.len());
            let mut any_error = false;
            let mut last_error: Option<(String, String, Value)> = None;
            for (id, name, input) in tool_uses {
                match self.tools.execute(name, input.clone()).await {
                    Ok(result) => {
                        if result.is_error {
                            any_error = true;
                            last_error = Some((name.to_string(), result.output.clone(), input.clone()));
                        }
                        self.apply_context_update(name, &result, iteration, conversation).await;
                        *self.context.tools_used_count.entry(name.to_string()).or_insert(0) += 1;
                        results.push(ContentBlock::tool_result(id.to_string(), result.output.clone(), result.is_error));
                    }
                    Err(e) => {
                        any_error = true;
                        last_error = Some((name.to_string(), e.to_string(), input.clone()));
                        results.push(ContentBlock::tool_result(id.to_string(), e.to_string(), true));
                    }
                }
            }
            conversation.push_tool_results(results);

            if any_error {
                self.context.consecutive_mistakes += 1;
                let (tool_name, error_message, tool_input) =
                    last_error.unwrap_or_else(|| ("unknown".to_string(), String::new(), json!({})));
                let context = json!({
                    "tool_name": tool_name,
                    "iteration": iteration,
                    "consecutive_mistakes": self.context.consecutive_mistakes,
                    "error_type": "tool_error",
                    "error_message": error_message.clone(),
                    "tool_input": tool_input,
                });
                self.reflection
                    .trigger(ReflectionTrigger::ToolError, context, conversation, iteration)
                    .await;
                if self.context.consecutive_mistakes >= MAX_CONSECUTIVE_MISTAKES {
                    let context = json!({
                        "mistake_count": self.context.consecutive_mistakes,
                        "iteration": iteration,
                        "pattern": tool_name,
                        "recent_errors": error_message,
                    });
                    self.reflection
                        .trigger(ReflectionTrigger::ConsecutiveMistakes, context, conversation, iteration)
                        .await;
                    self.context.status = TaskStatus::Aborted;
                    return TrialOutcome::AbortedOnMistakes;
                }
            } else {
                self.context.consecutive_mistakes = 0;
            }
        }

        info!("Trial {trial} exhausted after {} iterations", self.max_iterations);
        self.context.status = TaskStatus::Failed;
        TrialOutcome::Exhausted
    }

    /// Apply the Context-update rules table (§4.6) for one successfully
    /// dispatched tool call. `run_validation` updates unconditionally
    /// (pass or fail); every other tool here only updates on a non-error
    /// result, since a failed write/commit/branch/PR didn't actually happen.
    async fn apply_context_update(
        &mut self,
        name: &str,
        result: &ToolExecutionResult,
        iteration: u32,
        conversation: &Conversation,
    ) {
        match name {
            "run_validation" => {
                self.context.validation_performed = true;
                self.context.last_validation_iteration = Some(iteration);
                let lowered = result.output.to_lowercase();
                self.context.validation_passed =
                    VALIDATION_PASS_INDICATORS.iter().any(|indicator| lowered.contains(indicator));
                if !self.context.validation_passed {
                    let context = json!({
                        "iteration": iteration,
                        "validation_summary": result.output,
                        "files_modified": self.context.files_modified_json(),
                    });
                    self.reflection
                        .trigger(ReflectionTrigger::ValidationFailure, context, conversation, iteration)
                        .await;
                }
            }
            _ if result.is_error => {}
            "create_branch" => {
                if let Some(branch) = result.metadata.get("branch_name").and_then(Value::as_str) {
                    self.context.branch_name = Some(branch.to_string());
                }
            }
            "write_file" => {
                if let Some(path) = result.metadata.get("file_path").and_then(Value::as_str) {
                    self.context.files_modified.insert(path.to_string());
                }
                self.context.reset_validation_if_performed();
            }
            "git_commit" => {
                if let Some(branch) = result.metadata.get("branch_name").and_then(Value::as_str) {
                    self.context.branch_name = Some(branch.to_string());
                }
                self.context.reset_validation_if_performed();
            }
            "create_pull_request" => {
                if let Some(url) = result.metadata.get("pr_url").and_then(Value::as_str) {
                    self.context.pr_url = Some(url.to_string());
                }
            }
            "read_file" => {
                if let Some(path) = result.metadata.get("file_path").and_then(Value::as_str) {
                    self.context.files_accessed.insert(path.to_string());
                }
            }
            _ => {}
        }
    }

    /// `attempt_completion` is intercepted here, never dispatched to the
    /// registry. Gates on validation having passed at least once this
    /// trial, then runs a pre-completion reflection over the full task
    /// snapshot and inspects its insight text for an incomplete-work
    /// indicator — not the completion summary itself, since the model's own
    /// summary of its work is exactly what a pre-completion reflection
    /// exists to second-guess.
    async fn handle_attempt_completion(
        &mut self,
        summary: &str,
        conversation: &Conversation,
        iteration: u32,
    ) -> Option<TrialOutcome> {
        if !self.context.validation_passed {
            return None;
        }

        let original_task = conversation.messages().first().map(|m| m.content.text_content()).unwrap_or_default();
        let context = json!({
            "iterations_used": iteration,
            "completion_message": summary,
            "original_task": original_task,
            "modified_files_list": self.context.files_modified_json(),
            "validation_performed": self.context.validation_performed,
            "validation_passed": self.context.validation_passed,
            "tools_used": self.context.tools_used_json(),
        });
        if let Some(record) = self
            .reflection
            .trigger(ReflectionTrigger::PreCompletion, context, conversation, iteration)
            .await
        {
            let lowered = record.insight.to_lowercase();
            if INCOMPLETE_INDICATORS.iter().any(|indicator| lowered.contains(indicator)) {
                return None;
            }
        }
        self.context.status = TaskStatus::Completed;
        Some(TrialOutcome::Completed { summary: summary.to_string() })
    }

    fn rejection_reason(&self, summary: &str) -> String {
        if !self.context.validation_passed {
            "attempt_completion rejected: run_validation has not passed yet in this trial.".to_string()
        } else {
            format!(
                "attempt_completion rejected: the summary still indicates unfinished work (\"{}\"). \
                 Finish the remaining work before completing.",
                summary
            )
        }
    }

    fn build_system_prompt(&self) -> String {
        let mut builder = PromptBuilder::new();
        let branch = self.context.branch_name.as_deref().unwrap_or("(not yet created)");
        builder.add_context_section(
            "task_context",
            format!(
                "Repository: {}\nIssue: {}\nCurrent branch: {}\nIteration: {} of {}",
                non_empty_or(&self.repo_identifier, "(unspecified)"),
                non_empty_or(&self.issue_identifier, "(unspecified)"),
                branch,
                self.context.iteration_count,
                self.max_iterations,
            ),
        );
        if self.reflection.has_reflections() {
            let lessons = self.reflection.memory.format_for_prompt();
            builder.add_context_section("reflections", format!("Lessons from earlier in this task:\n{}", lessons));
        }
        builder.build(None, None, &HashMap::new())
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

impl ReflectionManager {
    /// Whether the `trial_failure` trigger is enabled — exposed so
    /// `execute_with_trials` can skip the reflection call entirely when
    /// disabled, without duplicating `ReflectionConfig`'s trigger lookup.
    fn trigger_enabled_for_trial_failure(&self) -> bool {
        self.config.enabled && self.config.triggers.trial_failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::reflection::ReflectionConfig;
    use crate::agent::types::{AssistantMessage, ToolDefinition, Usage};
    use crate::llm::ModelInfo;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedLlm {
        info: ModelInfo,
        responses: std::sync::Mutex<Vec<AssistantMessage>>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        fn model_info(&self) -> &ModelInfo {
            &self.info
        }

        async fn create_message(
            &self,
            _system: &str,
            _messages: &[Message],
            _tools: Option<&[ToolDefinition]>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<AssistantMessage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Ok(AssistantMessage {
                    content: MessageContent::Text(String::new()),
                    stop_reason: Some("end_turn".to_string()),
                    usage: None,
                });
            }
            Ok(responses.remove(0))
        }
    }

    fn assistant_tool_use(name: &str, input: Value) -> AssistantMessage {
        AssistantMessage {
            content: MessageContent::Blocks(vec![ContentBlock::tool_use("t1", name, input)]),
            stop_reason: Some("tool_use".to_string()),
            usage: Some(Usage::default()),
        }
    }

    fn assistant_text(text: &str) -> AssistantMessage {
        AssistantMessage {
            content: MessageContent::Text(text.to_string()),
            stop_reason: Some("end_turn".to_string()),
            usage: Some(Usage::default()),
        }
    }

    fn make_llm(responses: Vec<AssistantMessage>) -> Arc<ScriptedLlm> {
        Arc::new(ScriptedLlm {
            info: ModelInfo {
                provider: crate::llm::ModelProvider::Anthropic,
                model_id: "test-model".to_string(),
                context_window: 100_000,
                supports_tools: true,
                supports_streaming: false,
            },
            responses: std::sync::Mutex::new(responses),
            calls: AtomicU32::new(0),
        })
    }

    #[tokio::test]
    async fn completion_rejected_without_prior_validation() {
        let llm = make_llm(vec![assistant_tool_use(ATTEMPT_COMPLETION, json!({"summary": "done"}))]);
        let reflection = ReflectionManager::new(llm.clone(), ReflectionConfig { enabled: false, ..ReflectionConfig::default() });
        let mut task = AgentTask::new(llm, ToolRegistry::new(), reflection).with_max_iterations(2);
        let outcome = task.execute_with_trials("fix the bug", 1).await;
        assert!(matches!(outcome, TaskOutcome::AllTrialsFailed { .. }));
    }

    #[tokio::test]
    async fn completion_accepted_after_validation_passes() {
        let mut registry = ToolRegistry::new();
        struct AlwaysPass;
        #[async_trait]
        impl crate::tools::Tool for AlwaysPass {
            fn name(&self) -> &str {
                "run_validation"
            }
            fn description(&self) -> &str {
                "passes"
            }
            fn input_schema(&self) -> Value {
                json!({})
            }
            async fn execute(&self, _input: Value) -> Result<crate::tools::ToolExecutionResult> {
                Ok(crate::tools::ToolExecutionResult::ok("ok"))
            }
        }
        registry.register(AlwaysPass);

        let llm = make_llm(vec![
            assistant_tool_use("run_validation", json!({})),
            assistant_tool_use(ATTEMPT_COMPLETION, json!({"summary": "fixed and validated"})),
        ]);
        let reflection = ReflectionManager::new(llm.clone(), ReflectionConfig { enabled: false, ..ReflectionConfig::default() });
        let mut task = AgentTask::new(llm, registry, reflection).with_max_iterations(5);
        let outcome = task.execute_with_trials("fix the bug", 1).await;
        assert!(matches!(outcome, TaskOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn unknown_tool_call_surfaces_as_error_result_not_a_panic() {
        let llm = make_llm(vec![assistant_tool_use("does_not_exist", json!({}))]);
        let reflection = ReflectionManager::new(llm.clone(), ReflectionConfig { enabled: false, ..ReflectionConfig::default() });
        let mut task = AgentTask::new(llm, ToolRegistry::new(), reflection).with_max_iterations(1);
        let outcome = task.execute_with_trials("fix the bug", 1).await;
        assert!(matches!(outcome, TaskOutcome::AllTrialsFailed { .. }));
    }

    #[tokio::test]
    async fn write_file_success_resets_stale_validation() {
        let mut registry = ToolRegistry::new();
        struct AlwaysPassValidation;
        #[async_trait]
        impl crate::tools::Tool for AlwaysPassValidation {
            fn name(&self) -> &str {
                "run_validation"
            }
            fn description(&self) -> &str {
                "passes"
            }
            fn input_schema(&self) -> Value {
                json!({})
            }
            async fn execute(&self, _input: Value) -> Result<crate::tools::ToolExecutionResult> {
                Ok(crate::tools::ToolExecutionResult::ok("passed"))
            }
        }
        struct StubWrite;
        #[async_trait]
        impl crate::tools::Tool for StubWrite {
            fn name(&self) -> &str {
                "write_file"
            }
            fn description(&self) -> &str {
                "writes"
            }
            fn input_schema(&self) -> Value {
                json!({})
            }
            async fn execute(&self, _input: Value) -> Result<crate::tools::ToolExecutionResult> {
                Ok(crate::tools::ToolExecutionResult::ok("wrote").with_metadata(json!({"file_path": "a.py"})))
            }
        }
        registry.register(AlwaysPassValidation);
        registry.register(StubWrite);

        let llm = make_llm(vec![
            assistant_tool_use("run_validation", json!({})),
            assistant_tool_use("write_file", json!({"path": "a.py", "content": "x"})),
            assistant_tool_use(ATTEMPT_COMPLETION, json!({"summary": "done"})),
        ]);
        let reflection = ReflectionManager::new(llm.clone(), ReflectionConfig { enabled: false, ..ReflectionConfig::default() });
        let mut task = AgentTask::new(llm, registry, reflection).with_max_iterations(5);
        let outcome = task.execute_with_trials("fix the bug", 1).await;
        // The edit after validation invalidates the prior pass; completion
        // must be rejected until validation is re-run.
        assert!(matches!(outcome, TaskOutcome::AllTrialsFailed { .. }));
    }

    #[tokio::test]
    async fn five_consecutive_tool_use_free_responses_abort_but_four_do_not() {
        let llm = make_llm(vec![
            assistant_text("thinking one"),
            assistant_text("thinking two"),
            assistant_text("thinking three"),
            assistant_text("thinking four"),
        ]);
        let reflection = ReflectionManager::new(llm.clone(), ReflectionConfig { enabled: false, ..ReflectionConfig::default() });
        let mut task = AgentTask::new(llm, ToolRegistry::new(), reflection).with_max_iterations(4);
        let outcome = task.execute_with_trials("fix the bug", 1).await;
        // Exhausted (ran out of iterations), not aborted — four does not trip P6.
        assert!(matches!(outcome, TaskOutcome::AllTrialsFailed { .. }));

        let llm2 = make_llm(vec![
            assistant_text("thinking one"),
            assistant_text("thinking two"),
            assistant_text("thinking three"),
            assistant_text("thinking four"),
            assistant_text("thinking five"),
        ]);
        let reflection2 = ReflectionManager::new(llm2.clone(), ReflectionConfig { enabled: false, ..ReflectionConfig::default() });
        let mut task2 = AgentTask::new(llm2.clone(), ToolRegistry::new(), reflection2).with_max_iterations(10);
        let _ = task2.execute_with_trials("fix the bug", 1).await;
        // The fifth empty-of-tool-uses response must trigger abort well
        // before the 10-iteration cap, so only 5 LLM calls should occur.
        assert_eq!(llm2.calls.load(Ordering::SeqCst), 5);
    }
}
