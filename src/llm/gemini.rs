//! Dialect B: Gemini. Grounded on `original_source/llm/gemini_provider.py` —
//! role renaming (assistant -> model), `function_call`/`function_response`
//! parts instead of `tool_use`/`tool_result` blocks, synthesized tool-call
//! ids (Gemini doesn't assign them), and finish-reason remapping.

use super::{LlmProvider, ModelInfo, ModelProvider};
use crate::agent::types::{AssistantMessage, ContentBlock, Message, MessageContent, Role, ToolDefinition, Usage};
use crate::error::{Error, Result};
use crate::retry::{with_retry, RetryConfig};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    info: ModelInfo,
    retry: RetryConfig,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, model_id: impl Into<String>) -> Self {
        GeminiProvider {
            client: reqwest::Client::new(),
            api_key,
            info: ModelInfo {
                provider: ModelProvider::Gemini,
                model_id: model_id.into(),
                context_window: 1_048_576,
                supports_tools: true,
                supports_streaming: true,
            },
            retry: RetryConfig::from_env(),
        }
    }

    /// assistant -> model; tool_use -> function_call; tool_result ->
    /// function_response. Gemini has no concept of a separate system
    /// message in `contents`; the caller passes it via `system_instruction`.
    ///
    /// A `function_response.name` must echo the `function_call.name` it
    /// answers — Gemini correlates results by name, not by call id — so this
    /// walks the history in order, remembering each `tool_use_id`'s tool
    /// name as it's seen, to resolve the matching `ToolResult` later.
    fn format_messages(messages: &[Message]) -> Vec<Value> {
        let mut tool_names: std::collections::HashMap<&str, &str> = std::collections::HashMap::new();
        messages
            .iter()
            .map(|message| {
                let role = match message.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                let parts: Vec<Value> = match &message.content {
                    MessageContent::Text(text) => vec![json!({ "text": text })],
                    MessageContent::Blocks(blocks) => {
                        for block in blocks {
                            if let ContentBlock::ToolUse { id, name, .. } = block {
                                tool_names.insert(id.as_str(), name.as_str());
                            }
                        }
                        blocks.iter().map(|block| part_from_block(block, &tool_names)).collect()
                    }
                };
                json!({ "role": role, "parts": parts })
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Value {
        json!([{
            "function_declarations": tools.iter().map(|t| json!({
                "name": t.name,
                "description": t.description,
                "parameters": t.input_schema,
            })).collect::<Vec<_>>()
        }])
    }
}

fn part_from_block(block: &ContentBlock, tool_names: &std::collections::HashMap<&str, &str>) -> Value {
    match block {
        ContentBlock::Text { text } => json!({ "text": text }),
        ContentBlock::ToolUse { name, input, .. } => {
            json!({ "function_call": { "name": name, "args": input } })
        }
        ContentBlock::ToolResult { tool_use_id, content, .. } => {
            let name = tool_names.get(tool_use_id.as_str()).copied().unwrap_or("unknown");
            json!({ "function_response": { "name": name, "response": { "content": content } } })
        }
    }
}

fn map_finish_reason(reason: Option<&str>) -> Option<String> {
    match reason {
        Some("STOP") => Some("end_turn".to_string()),
        Some("MAX_TOKENS") => Some("max_tokens".to_string()),
        Some(other) => Some(other.to_lowercase()),
        None => None,
    }
}

/// Synthesize `tool_0`, `tool_1`, ... ids for `function_call` parts, since
/// Gemini's wire format doesn't assign one.
fn parse_candidate_parts(parts: &[Value]) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut tool_index = 0;
    for part in parts {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            blocks.push(ContentBlock::text(text.to_string()));
        } else if let Some(call) = part.get("functionCall").or_else(|| part.get("function_call")) {
            let name = call.get("name").and_then(Value::as_str).unwrap_or("").to_string();
            let input = call.get("args").cloned().unwrap_or(json!({}));
            blocks.push(ContentBlock::ToolUse {
                id: format!("tool_{}", tool_index),
                name,
                input,
            });
            tool_index += 1;
        }
    }
    blocks
}

#[async_trait]
impl LlmProvider for GeminiProvider {
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
        let contents = Self::format_messages(messages);

        let mut body = json!({
            "contents": contents,
            "system_instruction": { "parts": [{ "text": system }] },
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": max_tokens,
            },
        });
        if let Some(tools) = tools {
            if !tools.is_empty() {
                body["tools"] = Self::convert_tools(tools);
            }
        }

        let url = format!("{}/{}:generateContent?key={}", API_BASE, self.info.model_id, self.api_key.expose_secret());

        let response = with_retry(&self.retry, || {
            let body = body.clone();
            let url = url.clone();
            async move {
                let resp = self
                    .client
                    .post(&url)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| Error::Network(e.to_string()))?;

                let status = resp.status();
                if !status.is_success() {
                    let text = resp.text().await.unwrap_or_default();
                    return Err(Error::ProviderApi(format!("HTTP {}: {}", status.as_u16(), text)));
                }
                resp.json::<Value>().await.map_err(|e| Error::Network(e.to_string()))
            }
        })
        .await?;

        let candidate = response
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .ok_or_else(|| Error::ProviderApi("Gemini response contained no candidates".to_string()))?;

        let parts = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let blocks = parse_candidate_parts(&parts);

        let finish_reason = candidate.get("finishReason").and_then(Value::as_str);
        let usage = response.get("usageMetadata").map(|u| Usage {
            input_tokens: u.get("promptTokenCount").and_then(Value::as_u64).unwrap_or(0) as u32,
            output_tokens: u.get("candidatesTokenCount").and_then(Value::as_u64).unwrap_or(0) as u32,
            total_tokens: u.get("totalTokenCount").and_then(Value::as_u64).unwrap_or(0) as u32,
        });

        Ok(AssistantMessage {
            content: MessageContent::Blocks(blocks),
            stop_reason: map_finish_reason(finish_reason),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reason_stop_maps_to_end_turn() {
        assert_eq!(map_finish_reason(Some("STOP")), Some("end_turn".to_string()));
    }

    #[test]
    fn finish_reason_max_tokens_maps_through() {
        assert_eq!(map_finish_reason(Some("MAX_TOKENS")), Some("max_tokens".to_string()));
    }

    #[test]
    fn function_call_parts_get_sequential_synthesized_ids() {
        let parts = vec![
            json!({ "functionCall": { "name": "read_file", "args": { "path": "a.py" } } }),
            json!({ "functionCall": { "name": "write_file", "args": { "path": "b.py" } } }),
        ];
        let blocks = parse_candidate_parts(&parts);
        match (&blocks[0], &blocks[1]) {
            (ContentBlock::ToolUse { id: id0, .. }, ContentBlock::ToolUse { id: id1, .. }) => {
                assert_eq!(id0, "tool_0");
                assert_eq!(id1, "tool_1");
            }
            _ => panic!("expected two tool_use blocks"),
        }
    }
}
