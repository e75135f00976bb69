//! Dialect C: Ollama/local models. Grounded on
//! `original_source/llm/ollama_provider.py` — the only dialect without a
//! reliable structured tool-calling contract: most local models need tool
//! definitions serialized into the prompt and their calls recovered by
//! parsing the response text, with a retry-in-prompt-mode fallback when
//! structured mode itself errors out.

use super::{LlmProvider, ModelInfo, ModelProvider};
use crate::agent::types::{AssistantMessage, ContentBlock, Message, MessageContent, ToolDefinition, Usage};
use crate::error::{Error, Result};
use crate::retry::{with_retry, RetryConfig};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    info: ModelInfo,
    retry: RetryConfig,
    structured_output: bool,
}

impl OllamaProvider {
    pub fn new(model_id: impl Into<String>) -> Self {
        let base_url = std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs: u64 = std::env::var("OLLAMA_TIMEOUT").ok().and_then(|v| v.parse().ok()).unwrap_or(1800);
        let structured_output = std::env::var("OLLAMA_STRUCTURED_OUTPUT")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let client = if timeout_secs == 0 {
            reqwest::Client::new()
        } else {
            reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default()
        };

        OllamaProvider {
            client,
            base_url,
            info: ModelInfo {
                provider: ModelProvider::Ollama,
                model_id: model_id.into(),
                context_window: 8192,
                supports_tools: true,
                supports_streaming: true,
            },
            retry: RetryConfig::from_env(),
            structured_output,
        }
    }

    /// Render each tool's name/description/parameters plus a worked
    /// `attempt_completion` example into a deterministic instruction block,
    /// appended to the system prompt when not using structured output.
    fn tools_to_prompt(tools: &[ToolDefinition]) -> String {
        let mut out = String::from(
            "You have access to the following tools. To call one, respond with ONLY a JSON \
             object of the form {\"tool\": \"<name>\", \"input\": {...}} and nothing else.\n\n",
        );
        for tool in tools {
            out.push_str(&format!("### {}\n{}\n", tool.name, tool.description));
            if let Some(props) = tool.input_schema.get("properties").and_then(Value::as_object) {
                let required: Vec<&str> = tool
                    .input_schema
                    .get("required")
                    .and_then(Value::as_array)
                    .map(|arr| arr.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                for (name, schema) in props {
                    let marker = if required.contains(&name.as_str()) { "required" } else { "optional" };
                    let type_hint = schema.get("type").and_then(Value::as_str).unwrap_or("any");
                    out.push_str(&format!("  - {} ({}, {})\n", name, type_hint, marker));
                }
            }
            out.push('\n');
        }
        out.push_str(
            "When the task is fully done, call attempt_completion with a summary, e.g.\n\
             {\"tool\": \"attempt_completion\", \"input\": {\"result\": \"Added the missing \
             null check and verified validation passes.\"}}\n",
        );
        out
    }

    fn format_messages(system: &str, messages: &[Message], tools_prompt: Option<&str>) -> Vec<Value> {
        let mut out = Vec::with_capacity(messages.len() + 1);
        let mut system_content = system.to_string();
        if let Some(tools_prompt) = tools_prompt {
            system_content.push_str("\n\n");
            system_content.push_str(tools_prompt);
        }
        out.push(json!({ "role": "system", "content": system_content }));

        for message in messages {
            let role = match message.role {
                crate::agent::types::Role::User => "user",
                crate::agent::types::Role::Assistant => "assistant",
            };
            let text = simplify_to_text(&message.content);
            out.push(json!({ "role": role, "content": text }));
        }
        out
    }

    fn convert_tools_openai(tools: &[ToolDefinition]) -> Value {
        json!(tools
            .iter()
            .map(|t| json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.input_schema,
                }
            }))
            .collect::<Vec<_>>())
    }

    async fn call_chat(&self, body: &Value) -> Result<Value> {
        let url = format!("{}/api/chat", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::ProviderApi(format!("HTTP {}: {}", status.as_u16(), text)));
        }
        serde_json::from_str(&text).map_err(|e| Error::Json(e))
    }
}

/// Flatten a block-based message down to plain text; tool_result blocks
/// become a "Tool result: ..." line since Ollama has no first-class
/// tool-result message role in prompt mode.
fn simplify_to_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Blocks(blocks) => blocks
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.clone(),
                ContentBlock::ToolUse { name, input, .. } => {
                    format!("Called tool {} with input {}", name, input)
                }
                ContentBlock::ToolResult { content, is_error, .. } => {
                    if *is_error {
                        format!("Tool result (error): {}", content)
                    } else {
                        format!("Tool result: {}", content)
                    }
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Three-strategy text parse for a prompt-mode tool call: a fenced ```json
/// block, then a balanced-brace scan for the first top-level object, then
/// give up and treat the whole response as plain text.
fn parse_text_tool_call(text: &str) -> Option<(String, Value)> {
    if let Some(start) = text.find("```json") {
        let after = &text[start + 7..];
        if let Some(end) = after.find("```") {
            if let Ok(value) = serde_json::from_str::<Value>(after[..end].trim()) {
                return extract_tool_call(&value);
            }
        }
    }
    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        if let Some(end) = after.find("```") {
            if let Ok(value) = serde_json::from_str::<Value>(after[..end].trim()) {
                return extract_tool_call(&value);
            }
        }
    }

    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut start_idx = None;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => {
                if depth == 0 {
                    start_idx = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start_idx {
                        if let Ok(value) = serde_json::from_str::<Value>(&text[s..=i]) {
                            if let Some(call) = extract_tool_call(&value) {
                                return Some(call);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    debug!("No tool call recoverable from model text response; treating as plain text");
    None
}

fn extract_tool_call(value: &Value) -> Option<(String, Value)> {
    let name = value.get("tool").and_then(Value::as_str)?;
    let input = value.get("input").cloned().unwrap_or(json!({}));
    Some((name.to_string(), input))
}

const GRAMMAR_ERROR_SUBSTRINGS: &[&str] = &["grammar", "unexpected empty"];

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn model_info(&self) -> &ModelInfo {
        &self.info
    }

    async fn create_message(
        &self,
        system: &str,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<AssistantMessage> {
        let tools = tools.unwrap_or(&[]);
        let mut use_structured = self.structured_output && !tools.is_empty();

        loop {
            let tools_prompt = if use_structured || tools.is_empty() {
                None
            } else {
                Some(Self::tools_to_prompt(tools))
            };
            let wire_messages = Self::format_messages(system, messages, tools_prompt.as_deref());

            let mut body = json!({
                "model": self.info.model_id,
                "messages": wire_messages,
                "stream": false,
                "options": {
                    "temperature": temperature,
                    "num_predict": max_tokens,
                },
            });
            if use_structured {
                body["tools"] = Self::convert_tools_openai(tools);
            }

            let result = with_retry(&self.retry, || {
                let body = body.clone();
                async { self.call_chat(&body).await }
            })
            .await;

            let response = match result {
                Ok(r) => r,
                Err(e) if use_structured && GRAMMAR_ERROR_SUBSTRINGS.iter().any(|s| e.to_string().to_lowercase().contains(s)) => {
                    warn!("Structured tool calling failed ({}), retrying in prompt mode", e);
                    use_structured = false;
                    continue;
                }
                Err(e) => return Err(e),
            };

            return parse_response(&response, use_structured);
        }
    }
}

fn parse_response(response: &Value, structured: bool) -> Result<AssistantMessage> {
    let message = response
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("message"))
        .or_else(|| response.get("message"))
        .ok_or_else(|| Error::ProviderApi("Ollama response had no message field".to_string()))?;

    let content_text = message.get("content").and_then(Value::as_str).unwrap_or("").to_string();

    let mut blocks = Vec::new();

    if structured {
        if let Some(tool_calls) = message.get("tool_calls").and_then(Value::as_array) {
            for (i, call) in tool_calls.iter().enumerate() {
                let function = call.get("function").unwrap_or(call);
                let name = function.get("name").and_then(Value::as_str).unwrap_or("").to_string();
                let raw_args = function.get("arguments").cloned().unwrap_or(json!({}));
                let input = match raw_args {
                    Value::String(s) => serde_json::from_str(&s).unwrap_or(json!({})),
                    other => other,
                };
                blocks.push(ContentBlock::ToolUse {
                    id: format!("tool_{}", i),
                    name,
                    input,
                });
            }
        }
        if !content_text.is_empty() {
            blocks.push(ContentBlock::text(content_text.clone()));
        }
    } else if let Some((name, input)) = parse_text_tool_call(&content_text) {
        blocks.push(ContentBlock::ToolUse {
            id: "tool_0".to_string(),
            name,
            input,
        });
    } else {
        // Third strategy: no tool call recoverable from the text. Give up
        // and hand back the raw (possibly empty) text rather than erroring
        // — the loop's own empty-response counter is what must observe
        // this, not the provider-failure path.
        blocks.push(ContentBlock::text(content_text));
    }

    let usage = Some(Usage {
        input_tokens: response.get("prompt_eval_count").and_then(Value::as_u64).unwrap_or(0) as u32,
        output_tokens: response.get("eval_count").and_then(Value::as_u64).unwrap_or(0) as u32,
        total_tokens: (response.get("prompt_eval_count").and_then(Value::as_u64).unwrap_or(0)
            + response.get("eval_count").and_then(Value::as_u64).unwrap_or(0)) as u32,
    });

    Ok(AssistantMessage {
        content: MessageContent::Blocks(blocks),
        stop_reason: Some("end_turn".to_string()),
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json_tool_call() {
        let text = "Here's my plan:\n```json\n{\"tool\": \"read_file\", \"input\": {\"path\": \"a.py\"}}\n```";
        let (name, input) = parse_text_tool_call(text).unwrap();
        assert_eq!(name, "read_file");
        assert_eq!(input["path"], "a.py");
    }

    #[test]
    fn parses_balanced_brace_tool_call_without_fence() {
        let text = "I'll call {\"tool\": \"write_file\", \"input\": {\"path\": \"b.py\", \"content\": \"x\"}} now";
        let (name, _) = parse_text_tool_call(text).unwrap();
        assert_eq!(name, "write_file");
    }

    #[test]
    fn plain_prose_yields_no_tool_call() {
        assert!(parse_text_tool_call("I am still thinking about this.").is_none());
    }

    #[test]
    fn tools_to_prompt_lists_required_and_optional_params() {
        let tool = ToolDefinition {
            name: "read_file".to_string(),
            description: "Reads a file".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "path": { "type": "string" }, "encoding": { "type": "string" } },
                "required": ["path"],
            }),
        };
        let prompt = OllamaProvider::tools_to_prompt(&[tool]);
        assert!(prompt.contains("path (string, required)"));
        assert!(prompt.contains("encoding (string, optional)"));
    }
}
