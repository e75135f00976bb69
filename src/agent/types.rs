//! Shared conversation types: roles, content blocks, tool calls.
//!
//! Message content is a tagged sum rather than a flat string so that a single
//! representation survives round-trips through all three LLM wire dialects
//! (see `crate::llm`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A conversation participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One piece of a message's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Message content: either plain text or an ordered sequence of blocks.
///
/// Providers normalize whatever they received on the wire into one of these
/// two shapes; the loop only ever deals with this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Extract every `tool_use` block, in order. Empty for plain text.
    pub fn tool_uses(&self) -> Vec<(&str, &str, &Value)> {
        match self {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolUse { id, name, input } => Some((id.as_str(), name.as_str(), input)),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Concatenated text from all `text` blocks (or the plain string).
    pub fn text_content(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| b.as_text())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn is_empty_of_tool_uses(&self) -> bool {
        self.tool_uses().is_empty()
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<Vec<ContentBlock>> for MessageContent {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        MessageContent::Blocks(blocks)
    }
}

/// A single conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: MessageContent::Blocks(vec![ContentBlock::text(text)]),
        }
    }

    pub fn assistant(content: MessageContent) -> Self {
        Message {
            role: Role::Assistant,
            content,
        }
    }

    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        debug_assert!(results.iter().all(|b| matches!(b, ContentBlock::ToolResult { .. })));
        Message {
            role: Role::User,
            content: MessageContent::Blocks(results),
        }
    }
}

/// Anthropic-style tool schema exposed to every provider dialect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A single token-usage report.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// Normalized response from any provider dialect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub content: MessageContent,
    pub stop_reason: Option<String>,
    pub usage: Option<Usage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_uses_extracted_in_order() {
        let content = MessageContent::Blocks(vec![
            ContentBlock::text("thinking..."),
            ContentBlock::tool_use("t1", "read_file", json!({"path": "a.py"})),
            ContentBlock::tool_use("t2", "read_file", json!({"path": "b.py"})),
        ]);
        let uses = content.tool_uses();
        assert_eq!(uses.len(), 2);
        assert_eq!(uses[0].0, "t1");
        assert_eq!(uses[1].0, "t2");
    }

    #[test]
    fn plain_text_has_no_tool_uses() {
        let content = MessageContent::Text("hello".into());
        assert!(content.is_empty_of_tool_uses());
    }

    #[test]
    fn text_content_joins_blocks() {
        let content = MessageContent::Blocks(vec![
            ContentBlock::text("line one"),
            ContentBlock::tool_use("t1", "x", json!({})),
            ContentBlock::text("line two"),
        ]);
        assert_eq!(content.text_content(), "line one\nline two");
    }
}
