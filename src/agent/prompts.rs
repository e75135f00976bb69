//! Prompt Builder (C9): named, swappable prompt components joined into one
//! system prompt. Grounded on `original_source/prompts/builder.py`; the
//! teacher's `PromptBuilder` (a plain ordered-section joiner) is the
//! structural ancestor, generalized here to named/registered components with
//! include/exclude filtering and `{{var}}` context substitution, since the
//! spec's system prompt is assembled differently each iteration (the
//! workflow/rules sections are fixed, the task/context sections are not).

use std::collections::HashMap;

const SECTION_DELIMITER: &str = "\n\n====\n\n";

#[derive(Debug, Clone)]
struct PromptComponent {
    content: String,
    required: bool,
}

/// Registry of named prompt sections, rendered in registration order unless
/// `include`/`exclude` narrows the set.
pub struct PromptBuilder {
    order: Vec<String>,
    components: HashMap<String, PromptComponent>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        let mut builder = PromptBuilder { order: Vec::new(), components: HashMap::new() };
        builder.register_default_components();
        builder
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty builder with none of the default sections — useful for
    /// tests or a fully custom prompt.
    pub fn empty() -> Self {
        PromptBuilder { order: Vec::new(), components: HashMap::new() }
    }

    pub fn register(&mut self, name: impl Into<String>, content: impl Into<String>, required: bool) {
        let name = name.into();
        if !self.components.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.components.insert(name, PromptComponent { content: content.into(), required });
    }

    /// Register a non-required, dynamic section — e.g. the current task
    /// description or the reflection-memory summary, rebuilt each
    /// iteration.
    pub fn add_context_section(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.register(name, content, false);
    }

    fn register_default_components(&mut self) {
        self.register("agent_role", AGENT_ROLE, true);
        self.register("capabilities", CAPABILITIES, true);
        self.register("rules", RULES, true);
        self.register("workflow", WORKFLOW, true);
    }

    /// Render every registered section (in registration order), honoring
    /// `include`/`exclude` name filters, substituting `{{var}}` placeholders
    /// from `context`, and joining with the fixed section delimiter.
    /// Required sections are always rendered regardless of `exclude`.
    pub fn build(&self, include: Option<&[&str]>, exclude: Option<&[&str]>, context: &HashMap<String, String>) -> String {
        let sections: Vec<String> = self
            .order
            .iter()
            .filter_map(|name| {
                let component = self.components.get(name)?;
                if let Some(include) = include {
                    if !include.contains(&name.as_str()) {
                        return None;
                    }
                }
                if !component.required {
                    if let Some(exclude) = exclude {
                        if exclude.contains(&name.as_str()) {
                            return None;
                        }
                    }
                }
                Some(apply_context(&component.content, context))
            })
            .collect();
        sections.join(SECTION_DELIMITER)
    }
}

/// Substitute `{{key}}` with `context[key]`, leaving any placeholder whose
/// key isn't present in `context` untouched (unlike the reflection prompt's
/// single-brace template, which substitutes `"N/A"` for a miss — these are
/// two distinct, deliberately different substitution rules).
fn apply_context(template: &str, context: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            if let Some(end) = template[i + 2..].find("}}") {
                let key = template[i + 2..i + 2 + end].trim();
                if key.chars().all(|c| c.is_alphanumeric() || c == '_') && !key.is_empty() {
                    match context.get(key) {
                        Some(value) => {
                            out.push_str(value);
                            i = i + 2 + end + 2;
                            continue;
                        }
                        None => {
                            out.push_str(&template[i..i + 2 + end + 2]);
                            i = i + 2 + end + 2;
                            continue;
                        }
                    }
                }
            }
        }
        let ch = template[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

const AGENT_ROLE: &str = "\
You are an autonomous coding agent. You are given a single work-tracker \
issue describing a change to make in a real software repository. You work \
independently, with no human in the loop during execution, until the \
change is implemented, validated, and submitted as a pull request.";

const CAPABILITIES: &str = "\
You can read and write files in the cloned repository, run the \
repository's validation command, create a branch, commit your changes, \
push them, and open a pull request. You do not have a shell beyond what \
your tools expose, and you cannot ask the user a clarifying question — \
make the most reasonable interpretation of the issue and proceed.";

const RULES: &str = "\
CRITICAL: Never call post_comment during normal execution. It is reserved \
for a final status update after the task has fully concluded (success or \
irrecoverable failure) — using it mid-task will be treated as premature \
completion.

CRITICAL: You MUST run run_validation at least once, and it MUST pass, \
before calling attempt_completion. Calling attempt_completion without a \
passing validation run is not acceptable.

Make the smallest change that correctly and completely addresses the \
issue. Do not refactor unrelated code.";

const WORKFLOW: &str = "\
Work in this order: read the issue, explore the repository to find the \
relevant code, make the edits, run validation, fix anything it flags, and \
only once it passes, commit your changes on a new branch and open a pull \
request. Call attempt_completion only once everything above is done.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_joins_sections_with_fixed_delimiter() {
        let builder = PromptBuilder::new();
        let prompt = builder.build(None, None, &HashMap::new());
        assert!(prompt.contains(SECTION_DELIMITER));
    }

    #[test]
    fn required_sections_survive_exclude() {
        let builder = PromptBuilder::new();
        let prompt = builder.build(None, Some(&["rules"]), &HashMap::new());
        assert!(prompt.contains("Never call post_comment"));
    }

    #[test]
    fn include_narrows_to_named_sections_only() {
        let builder = PromptBuilder::new();
        let prompt = builder.build(Some(&["agent_role"]), None, &HashMap::new());
        assert!(prompt.contains("autonomous coding agent"));
        assert!(!prompt.contains("CRITICAL"));
    }

    #[test]
    fn context_section_substitutes_known_vars_and_leaves_unknown() {
        let mut builder = PromptBuilder::empty();
        builder.add_context_section("task", "Issue #{{issue_number}}: {{missing}}");
        let mut ctx = HashMap::new();
        ctx.insert("issue_number".to_string(), "42".to_string());
        let prompt = builder.build(None, None, &ctx);
        assert!(prompt.contains("Issue #42"));
        assert!(prompt.contains("{{missing}}"));
    }
}
