//! Reflexion framework: bounded reflection memory (C1) and the manager that
//! decides when to call the LLM in "reflect" mode (C2).
//!
//! Grounded on `original_source/agent/reflection.py`; the teacher's own
//! `src/agent/reflector.rs` is a non-compiling stub (references undefined
//! `PromptTemplate::reflection_prompt`/`ExecutionPlan` types) and is not used
//! as a structural model here beyond its general "reflect-then-parse" shape.

use crate::agent::conversation::Conversation;
use crate::agent::types::{ContentBlock, MessageContent, Role};
use crate::llm::LlmProvider;
use crate::error::Result;
use crate::repository::reflection_cache::ReflectionCache;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Named condition whose occurrence prompts a reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionTrigger {
    ValidationFailure,
    ToolError,
    ConsecutiveMistakes,
    Periodic,
    TrialFailure,
    PreCompletion,
}

impl ReflectionTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReflectionTrigger::ValidationFailure => "validation_failure",
            ReflectionTrigger::ToolError => "tool_error",
            ReflectionTrigger::ConsecutiveMistakes => "consecutive_mistakes",
            ReflectionTrigger::Periodic => "periodic",
            ReflectionTrigger::TrialFailure => "trial_failure",
            ReflectionTrigger::PreCompletion => "pre_completion",
        }
    }
}

impl std::fmt::Display for ReflectionTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One stored lesson (C1 "reflection record").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionRecord {
    pub iteration: u32,
    pub trigger: ReflectionTrigger,
    pub context: Value,
    pub insight: String,
    pub timestamp: DateTime<Utc>,
    pub applied: bool,
}

impl ReflectionRecord {
    pub fn new(iteration: u32, trigger: ReflectionTrigger, context: Value, insight: String) -> Self {
        ReflectionRecord {
            iteration,
            trigger,
            context,
            insight,
            timestamp: Utc::now(),
            applied: false,
        }
    }
}

/// Bounded FIFO of reflection records (C1). `memory_size` is the capacity;
/// `append` evicts element 0 on overflow (I-R1), and no operation here ever
/// reorders the underlying sequence (I-R2).
#[derive(Debug, Clone)]
pub struct ReflectionMemory {
    records: VecDeque<ReflectionRecord>,
    memory_size: usize,
}

impl ReflectionMemory {
    pub fn new(memory_size: usize) -> Self {
        ReflectionMemory {
            records: VecDeque::with_capacity(memory_size),
            memory_size: memory_size.max(1),
        }
    }

    /// Appends `record`; if length now exceeds `memory_size`, removes the
    /// oldest element. Guarantees I-R1 and I-R2.
    pub fn append(&mut self, record: ReflectionRecord) {
        self.records.push_back(record);
        while self.records.len() > self.memory_size {
            self.records.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn entries(&self) -> &VecDeque<ReflectionRecord> {
        &self.records
    }

    /// Last `k` (or fewer) records, insertion order.
    pub fn recent(&self, k: usize) -> Vec<&ReflectionRecord> {
        let start = self.records.len().saturating_sub(k);
        self.records.iter().skip(start).collect()
    }

    pub fn by_trigger(&self, trigger: ReflectionTrigger) -> Vec<&ReflectionRecord> {
        self.records.iter().filter(|r| r.trigger == trigger).collect()
    }

    /// Grouped-by-trigger summary, last three records per group. Fixed
    /// string when empty.
    pub fn format_for_prompt(&self) -> String {
        if self.records.is_empty() {
            return "No previous reflections available - this is a fresh attempt.".to_string();
        }

        let triggers = [
            ReflectionTrigger::ValidationFailure,
            ReflectionTrigger::ToolError,
            ReflectionTrigger::ConsecutiveMistakes,
            ReflectionTrigger::Periodic,
            ReflectionTrigger::TrialFailure,
            ReflectionTrigger::PreCompletion,
        ];

        let mut sections = Vec::new();
        for trigger in triggers {
            let group = self.by_trigger(trigger);
            if group.is_empty() {
                continue;
            }
            let last_three = &group[group.len().saturating_sub(3)..];
            let mut section = format!("### Lessons from {}\n", trigger.as_str());
            for record in last_three {
                section.push_str(&format!("- [Iteration {}] {}\n", record.iteration, record.insight));
            }
            sections.push(section);
        }
        sections.join("\n")
    }

    /// Flat list of the last `k` records, each prefixed with iteration and
    /// trigger name.
    pub fn format_for_context(&self, k: usize) -> String {
        if self.records.is_empty() {
            return "None (first attempt)".to_string();
        }
        self.recent(k)
            .iter()
            .map(|r| format!("[Iteration {} - {}] {}", r.iteration, r.trigger.as_str(), r.insight))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Sort `records` by `(trigger == validation_failure, timestamp)`
    /// descending, take `limit`, reset each `applied` flag, then append each
    /// (obeying I-R1 via the normal `append` path).
    pub fn seed(&mut self, mut records: Vec<ReflectionRecord>, limit: usize) {
        records.sort_by(|a, b| {
            let a_key = (a.trigger == ReflectionTrigger::ValidationFailure, a.timestamp);
            let b_key = (b.trigger == ReflectionTrigger::ValidationFailure, b.timestamp);
            b_key.cmp(&a_key)
        });
        for mut record in records.into_iter().take(limit) {
            record.applied = false;
            self.append(record);
        }
    }
}

/// Execution mode for the Reflexion framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionMode {
    WithinTask,
    MultiTrial,
    Hybrid,
}

/// Per-trigger enable toggles, read from `REFLEXION_TRIGGER_*`.
#[derive(Debug, Clone, Copy)]
pub struct TriggerToggles {
    pub validation_failure: bool,
    pub tool_error: bool,
    pub consecutive_mistakes: bool,
    pub periodic: bool,
    pub trial_failure: bool,
    pub pre_completion: bool,
}

impl Default for TriggerToggles {
    fn default() -> Self {
        TriggerToggles {
            validation_failure: true,
            tool_error: true,
            consecutive_mistakes: true,
            periodic: true,
            trial_failure: true,
            pre_completion: true,
        }
    }
}

/// Reflection configuration, immutable per task (§3).
#[derive(Debug, Clone)]
pub struct ReflectionConfig {
    pub enabled: bool,
    pub mode: ReflectionMode,
    pub memory_size: usize,
    pub temperature: f32,
    pub triggers: TriggerToggles,
    pub max_trials: usize,
    pub persist_across_issues: bool,
    pub repo_cache_dir: Option<PathBuf>,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        ReflectionConfig {
            enabled: true,
            mode: ReflectionMode::WithinTask,
            memory_size: 10,
            temperature: 0.5,
            triggers: TriggerToggles::default(),
            max_trials: 5,
            persist_across_issues: false,
            repo_cache_dir: None,
        }
    }
}

impl ReflectionConfig {
    /// Load from environment variables, falling back to defaults for any
    /// value that is absent or unparsable.
    pub fn from_env() -> Self {
        let mut config = ReflectionConfig::default();

        if let Ok(v) = std::env::var("REFLEXION_ENABLED") {
            config.enabled = v != "false" && v != "0";
        }
        if let Ok(v) = std::env::var("REFLEXION_MODE") {
            config.mode = match v.as_str() {
                "multi_trial" => ReflectionMode::MultiTrial,
                "hybrid" => ReflectionMode::Hybrid,
                _ => ReflectionMode::WithinTask,
            };
        }
        if let Ok(v) = std::env::var("REFLEXION_MEMORY_SIZE") {
            if let Ok(n) = v.parse() {
                config.memory_size = n;
            }
        }
        if let Ok(v) = std::env::var("REFLEXION_TEMPERATURE") {
            if let Ok(t) = v.parse() {
                config.temperature = t;
            }
        }
        if let Ok(v) = std::env::var("REFLEXION_MAX_TRIALS") {
            if let Ok(n) = v.parse() {
                config.max_trials = n;
            }
        }
        if let Ok(v) = std::env::var("REFLEXION_PERSIST_ACROSS_ISSUES") {
            config.persist_across_issues = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("REFLEXION_REPO_CACHE_DIR") {
            config.repo_cache_dir = Some(PathBuf::from(v));
        }

        macro_rules! toggle {
            ($env:literal, $field:ident) => {
                if let Ok(v) = std::env::var($env) {
                    config.triggers.$field = v != "false" && v != "0";
                }
            };
        }
        toggle!("REFLEXION_TRIGGER_VALIDATION_FAILURE", validation_failure);
        toggle!("REFLEXION_TRIGGER_TOOL_ERROR", tool_error);
        toggle!("REFLEXION_TRIGGER_CONSECUTIVE_MISTAKES", consecutive_mistakes);
        toggle!("REFLEXION_TRIGGER_PERIODIC", periodic);
        toggle!("REFLEXION_TRIGGER_TRIAL_FAILURE", trial_failure);
        toggle!("REFLEXION_TRIGGER_PRE_COMPLETION", pre_completion);

        config
    }
}

/// Render a Python-`str.format()`-style template (`{key}` placeholders,
/// single braces) against a context map, substituting the literal string
/// `"N/A"` for any referenced key the context doesn't supply (§4.2's prompt
/// assembly rule).
fn render_template(template: &str, context: &std::collections::HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = template[i + 1..].find('}') {
                let key = &template[i + 1..i + 1 + end];
                if key.chars().all(|c| c.is_alphanumeric() || c == '_') && !key.is_empty() {
                    out.push_str(context.get(key).map(String::as_str).unwrap_or("N/A"));
                    i = i + 1 + end + 1;
                    continue;
                }
            }
        }
        let ch = template[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    let _ = &mut chars;
    out
}

fn trigger_prompt_template(trigger: ReflectionTrigger) -> &'static str {
    match trigger {
        ReflectionTrigger::ValidationFailure => {
            "Validation failed at iteration {iteration}.\n\n\
             Validation summary: {validation_summary}\n\
             Failed tests: {failed_tests}\n\
             Lint issues: {lint_issues}\n\
             Static analysis errors: {static_errors}\n\
             Files modified so far: {files_modified}\n\n\
             Recent actions:\n{recent_actions}\n\n\
             Previous lessons:\n{previous_reflections}\n\n\
             In 2-4 sentences, diagnose why validation failed and state the single most \
             important thing to do differently on the next attempt."
        }
        ReflectionTrigger::ToolError => {
            "Tool '{tool_name}' failed at iteration {iteration} (consecutive mistakes: \
             {consecutive_mistakes}).\n\n\
             Error type: {error_type}\n\
             Error message: {error_message}\n\
             Tool input: {tool_input}\n\n\
             Recent actions:\n{recent_actions}\n\n\
             Previous lessons:\n{previous_reflections}\n\n\
             In 2-4 sentences, explain the likely cause and how to avoid this error going \
             forward."
        }
        ReflectionTrigger::ConsecutiveMistakes => {
            "The agent has made {mistake_count} consecutive mistakes by iteration \
             {iteration} (pattern: {pattern}).\n\n\
             Recent errors:\n{recent_errors}\n\n\
             Recent actions:\n{recent_actions}\n\n\
             Previous lessons:\n{previous_reflections}\n\n\
             In 2-4 sentences, identify the repeated failure pattern and recommend a \
             concretely different approach."
        }
        ReflectionTrigger::Periodic => {
            "Periodic checkpoint at iteration {iteration}.\n\n\
             Files accessed: {files_accessed}\n\
             Files modified: {files_modified}\n\
             Validation performed: {validation_performed}; validation passed: \
             {validation_passed}\n\
             Tools used so far:\n{tools_used}\n\n\
             Recent actions:\n{recent_actions}\n\n\
             Previous lessons:\n{previous_reflections}\n\n\
             In 2-4 sentences, assess whether progress is on track and note anything worth \
             adjusting."
        }
        ReflectionTrigger::PreCompletion => {
            "The agent is about to call attempt_completion after {iterations_used} \
             iterations with message: {completion_message}\n\n\
             Original task:\n{original_task}\n\n\
             Files modified:\n{modified_files_list}\n\
             Validation performed: {validation_performed}; validation passed: \
             {validation_passed}\n\
             Tools used:\n{tools_used}\n\n\
             Carefully verify the task is FULLY complete against the original request. If \
             anything required is missing, incomplete, or untested, say so explicitly and \
             name what remains. Otherwise confirm completeness in one sentence."
        }
        ReflectionTrigger::TrialFailure => {
            "Trial {trial_number} failed after {iterations_used} iterations (abort reason: \
             {abort_reason}; completion attempted: {completion_attempted}).\n\n\
             Files modified: {files_modified}\n\
             Validation performed: {validation_performed}; validation passed: \
             {validation_passed}\n\
             Tools used:\n{tools_used}\n\
             Key decisions: {key_decisions}\n\
             Summary: {full_conversation}\n\n\
             In 3-5 sentences, produce a comprehensive lesson for the next trial: what went \
             wrong and what strategy to try instead."
        }
    }
}

/// Extract the recent-actions block from the last five conversation entries
/// (§4.2): one line per `tool_use` block and one line per user text message.
fn extract_recent_actions(conversation: &Conversation) -> String {
    let recent = conversation.recent(5);
    let mut lines = Vec::new();
    for message in recent {
        match &message.content {
            MessageContent::Blocks(blocks) => {
                for block in blocks {
                    if let ContentBlock::ToolUse { name, input, .. } = block {
                        let input_str = input.to_string();
                        let snippet: String = input_str.chars().take(100).collect();
                        lines.push(format!("- Used tool: {} (input: {}...)", name, snippet));
                    }
                }
                if message.role == Role::User {
                    let text = message.content.text_content();
                    if !text.is_empty() && !blocks.iter().any(|b| matches!(b, ContentBlock::ToolUse { .. })) {
                        let snippet: String = text.chars().take(150).collect();
                        lines.push(format!("- User message: {}...", snippet));
                    }
                }
            }
            MessageContent::Text(text) => {
                if message.role == Role::User {
                    let snippet: String = text.chars().take(150).collect();
                    lines.push(format!("- User message: {}...", snippet));
                }
            }
        }
    }
    if lines.is_empty() {
        "No recent actions recorded".to_string()
    } else {
        lines.join("\n")
    }
}

fn context_to_strings(context: &Value) -> std::collections::HashMap<String, String> {
    let mut map = std::collections::HashMap::new();
    if let Value::Object(obj) = context {
        for (k, v) in obj {
            let s = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            map.insert(k.clone(), s);
        }
    }
    map
}

/// Decides when to call the LLM in "reflect" mode and stores the resulting
/// insights (C2).
pub struct ReflectionManager {
    llm: Arc<dyn LlmProvider>,
    pub config: ReflectionConfig,
    pub memory: ReflectionMemory,
    cache: Option<ReflectionCache>,
}

impl ReflectionManager {
    pub fn new(llm: Arc<dyn LlmProvider>, config: ReflectionConfig) -> Self {
        let memory = ReflectionMemory::new(config.memory_size);
        ReflectionManager {
            llm,
            config,
            memory,
            cache: None,
        }
    }

    /// If persistence is enabled, open the cache and seed memory with up to
    /// three prior records for this repository.
    pub async fn initialize(&mut self, repo_owner: &str, repo_name: &str) -> Result<()> {
        if !self.config.persist_across_issues {
            return Ok(());
        }
        let dir = self
            .config
            .repo_cache_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".tarsis_cache"));
        let cache = ReflectionCache::new(dir)?;
        let records = cache.load_reflections(repo_owner, repo_name, 30)?;
        if !records.is_empty() {
            info!("Seeding reflection memory with {} prior record(s)", records.len().min(3));
            self.memory.seed(records, 3);
        }
        self.cache = Some(cache);
        Ok(())
    }

    /// If persistence is enabled and memory is non-empty, save current
    /// reflections to the cache.
    pub async fn finalize(&self, repo_owner: &str, repo_name: &str, issue_number: &str) -> Result<()> {
        if !self.config.persist_across_issues || self.memory.is_empty() {
            return Ok(());
        }
        if let Some(cache) = &self.cache {
            let records: Vec<ReflectionRecord> = self.memory.entries().iter().cloned().collect();
            cache.save_reflections(repo_owner, repo_name, issue_number, &records)?;
        }
        Ok(())
    }

    pub fn has_reflections(&self) -> bool {
        !self.memory.is_empty()
    }

    pub fn count_applied_lessons(&self) -> usize {
        self.memory.entries().iter().filter(|r| r.applied).count()
    }

    /// Build a trigger-specific prompt, call the LLM in reflection mode
    /// (temperature from config, no tools), store the resulting insight.
    /// Failures are logged and swallowed — the loop must not crash on
    /// reflection error.
    pub async fn trigger(
        &mut self,
        trigger: ReflectionTrigger,
        context: Value,
        conversation: &Conversation,
        iteration: u32,
    ) -> Option<ReflectionRecord> {
        if !self.trigger_enabled(trigger) {
            return None;
        }

        match self.generate_reflection(trigger, &context, conversation, iteration).await {
            Ok(insight) => {
                let record = ReflectionRecord::new(iteration, trigger, context, insight);
                self.memory.append(record.clone());
                Some(record)
            }
            Err(e) => {
                warn!("Reflection generation failed for trigger {}: {}", trigger, e);
                None
            }
        }
    }

    fn trigger_enabled(&self, trigger: ReflectionTrigger) -> bool {
        if !self.config.enabled {
            return false;
        }
        match trigger {
            ReflectionTrigger::ValidationFailure => self.config.triggers.validation_failure,
            ReflectionTrigger::ToolError => self.config.triggers.tool_error,
            ReflectionTrigger::ConsecutiveMistakes => self.config.triggers.consecutive_mistakes,
            ReflectionTrigger::Periodic => self.config.triggers.periodic,
            ReflectionTrigger::TrialFailure => self.config.triggers.trial_failure,
            ReflectionTrigger::PreCompletion => self.config.triggers.pre_completion,
        }
    }

    async fn generate_reflection(
        &self,
        trigger: ReflectionTrigger,
        context: &Value,
        conversation: &Conversation,
        _iteration: u32,
    ) -> Result<String> {
        let mut vars = context_to_strings(context);
        vars.insert("recent_actions".to_string(), extract_recent_actions(conversation));
        vars.insert("previous_reflections".to_string(), self.memory.format_for_context(5));

        let prompt = render_template(trigger_prompt_template(trigger), &vars);
        debug!("Built reflection prompt for trigger {} ({} chars)", trigger, prompt.len());

        let response = self
            .llm
            .generate(
                "You are reflecting on an autonomous coding agent's recent trajectory. \
                 Respond with a short, actionable insight only.",
                &[crate::agent::types::Message::user_text(prompt)],
                None,
                self.config.temperature,
                2048,
            )
            .await?;

        Ok(response.content.text_content())
    }
}

pub mod parser {
    //! Optional post-processing over a reflection insight string. Never
    //! load-bearing for the pre-completion gate (§4.6 step 6 uses the plain
    //! substring rule directly); used only for the richer learning-summary
    //! diagnostic. Grounded on `original_source/agent/reflection.py`'s
    //! `ReflectionParser`, a feature the distilled spec dropped.

    /// Lines starting with an imperative bullet ("- ", "* ", digit+'.').
    pub fn extract_action_items(insight: &str) -> Vec<String> {
        insight
            .lines()
            .map(str::trim)
            .filter(|line| {
                line.starts_with("- ")
                    || line.starts_with("* ")
                    || line.chars().next().is_some_and(|c| c.is_ascii_digit())
            })
            .map(|line| line.trim_start_matches(['-', '*', ' ']).to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Recurring vocabulary across the insight: a coarse proxy for "patterns"
    /// the agent keeps hitting, keyed by a small fixed watch-list.
    pub fn extract_patterns(insight: &str) -> Vec<String> {
        const WATCHLIST: &[&str] = &[
            "timeout", "permission", "import", "syntax", "type error", "not found", "conflict",
        ];
        let lower = insight.to_lowercase();
        WATCHLIST
            .iter()
            .filter(|kw| lower.contains(*kw))
            .map(|kw| kw.to_string())
            .collect()
    }

    /// First non-empty line, truncated — a one-line "key lesson" summary.
    pub fn key_lesson(insight: &str) -> String {
        insight
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(|l| l.chars().take(200).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(iteration: u32, trigger: ReflectionTrigger, insight: &str) -> ReflectionRecord {
        ReflectionRecord::new(iteration, trigger, json!({}), insight.to_string())
    }

    #[test]
    fn append_evicts_oldest_on_overflow() {
        let mut mem = ReflectionMemory::new(2);
        mem.append(record(1, ReflectionTrigger::Periodic, "first"));
        mem.append(record(2, ReflectionTrigger::Periodic, "second"));
        mem.append(record(3, ReflectionTrigger::Periodic, "third"));

        assert_eq!(mem.len(), 2);
        let insights: Vec<_> = mem.entries().iter().map(|r| r.insight.as_str()).collect();
        assert_eq!(insights, vec!["second", "third"]);
    }

    #[test]
    fn format_for_prompt_empty_returns_fixed_string() {
        let mem = ReflectionMemory::new(10);
        assert!(mem.format_for_prompt().contains("No previous reflections"));
    }

    #[test]
    fn format_for_prompt_groups_by_trigger_last_three() {
        let mut mem = ReflectionMemory::new(10);
        for i in 0..5 {
            mem.append(record(i, ReflectionTrigger::ToolError, &format!("lesson {}", i)));
        }
        let formatted = mem.format_for_prompt();
        assert!(formatted.contains("lesson 2"));
        assert!(formatted.contains("lesson 4"));
        assert!(!formatted.contains("lesson 0"));
    }

    #[test]
    fn format_for_context_prefixes_iteration_and_trigger() {
        let mut mem = ReflectionMemory::new(10);
        mem.append(record(3, ReflectionTrigger::ValidationFailure, "fix the import"));
        let formatted = mem.format_for_context(5);
        assert!(formatted.contains("[Iteration 3 - validation_failure]"));
    }

    #[test]
    fn seed_preserves_bound_and_resets_applied() {
        let mut mem = ReflectionMemory::new(2);
        let mut r1 = record(1, ReflectionTrigger::Periodic, "a");
        r1.applied = true;
        let r2 = record(2, ReflectionTrigger::ValidationFailure, "b");
        let r3 = record(3, ReflectionTrigger::ToolError, "c");
        mem.seed(vec![r1, r2, r3], 2);

        assert_eq!(mem.len(), 2);
        assert!(mem.entries().iter().all(|r| !r.applied));
    }

    #[test]
    fn render_template_substitutes_na_for_missing_keys() {
        let mut ctx = std::collections::HashMap::new();
        ctx.insert("iteration".to_string(), "4".to_string());
        let out = render_template("iter={iteration} missing={missing_key}", &ctx);
        assert_eq!(out, "iter=4 missing=N/A");
    }

    #[test]
    fn extract_action_items_picks_bullets() {
        let insight = "The fix:\n- add a type hint\n- re-run tests\nSome prose.";
        let items = parser::extract_action_items(insight);
        assert_eq!(items, vec!["add a type hint", "re-run tests"]);
    }
}
