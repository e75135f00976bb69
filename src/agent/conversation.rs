//! Conversation store (C4): an append-only, per-task ordered message sequence.
//!
//! Unlike a chat-bot's per-user `ConversationManager`, a task's conversation
//! is owned outright by the `AgentTask` running it and never shared across
//! tasks (§5 "The Conversation Store is owned by its task; never shared").

use crate::agent::types::{ContentBlock, Message, Role};
use std::collections::HashSet;

/// The ordered message history for a single task trial.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Conversation { messages: Vec::new() }
    }

    /// Append the initial user seed: a single `text` block.
    pub fn push_user_text(&mut self, text: impl Into<String>) {
        self.push(Message::user_text(text));
    }

    /// Append the provider's normalized response.
    pub fn push_assistant(&mut self, message: Message) {
        debug_assert_eq!(message.role, Role::Assistant);
        self.push(message);
    }

    /// Append a single user message carrying one `tool_result` block per
    /// call in the preceding assistant message, in the same order (I-C2).
    pub fn push_tool_results(&mut self, results: Vec<ContentBlock>) {
        self.push(Message::tool_results(results));
    }

    fn push(&mut self, message: Message) {
        debug_assert!(
            self.messages.last().map(|m| m.role) != Some(message.role),
            "I-C3 violated: adjacent messages must not share a role"
        );
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// The last assistant message, if any — used to check I-C2's precondition
    /// ("ends with an assistant message whose tool_uses are all answered").
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Last `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Verify I-C1: every `tool_result` block's call-id matches a `tool_use`
    /// block that appears earlier in the conversation. Exposed for tests and
    /// debug assertions, not called on every append (O(n) over history).
    pub fn check_tool_result_alignment(&self) -> bool {
        let mut seen_tool_use_ids: HashSet<&str> = HashSet::new();
        for message in &self.messages {
            if let crate::agent::types::MessageContent::Blocks(blocks) = &message.content {
                for block in blocks {
                    match block {
                        ContentBlock::ToolUse { id, .. } => {
                            seen_tool_use_ids.insert(id.as_str());
                        }
                        ContentBlock::ToolResult { tool_use_id, .. } => {
                            if !seen_tool_use_ids.contains(tool_use_id.as_str()) {
                                return false;
                            }
                        }
                        ContentBlock::Text { .. } => {}
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::MessageContent;
    use serde_json::json;

    #[test]
    fn new_conversation_is_empty() {
        let conv = Conversation::new();
        assert!(conv.is_empty());
        assert_eq!(conv.len(), 0);
    }

    #[test]
    fn alternating_roles_pass_alignment_check() {
        let mut conv = Conversation::new();
        conv.push_user_text("please read a.py");
        conv.push_assistant(Message::assistant(MessageContent::Blocks(vec![
            ContentBlock::tool_use("t1", "read_file", json!({"path": "a.py"})),
        ])));
        conv.push_tool_results(vec![ContentBlock::tool_result("t1", "contents of a.py", false)]);

        assert_eq!(conv.len(), 3);
        assert!(conv.check_tool_result_alignment());
    }

    #[test]
    fn unmatched_tool_result_fails_alignment_check() {
        let mut conv = Conversation::new();
        conv.push_tool_results(vec![ContentBlock::tool_result("orphan", "x", false)]);
        assert!(!conv.check_tool_result_alignment());
    }

    #[test]
    fn last_assistant_message_found() {
        let mut conv = Conversation::new();
        conv.push_user_text("hi");
        conv.push_assistant(Message::assistant(MessageContent::Text("hello".into())));
        assert!(conv.last_assistant_message().is_some());
    }

    #[test]
    #[should_panic(expected = "I-C3")]
    fn adjacent_same_role_panics_in_debug() {
        let mut conv = Conversation::new();
        conv.push_user_text("one");
        conv.push_user_text("two");
    }
}
