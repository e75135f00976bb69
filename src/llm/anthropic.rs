//! Dialect A: Anthropic. Grounded on
//! `original_source/llm/anthropic_provider.py` — the native wire shape
//! already matches the block model almost verbatim, so this dialect does
//! the least translation work of the three.

use super::{LlmProvider, ModelInfo, ModelProvider};
use crate::agent::types::{AssistantMessage, ContentBlock, Message, MessageContent, Role, ToolDefinition, Usage};
use crate::error::{Error, Result};
use crate::retry::{with_retry, RetryConfig};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

const API_BASE: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    info: ModelInfo,
    retry: RetryConfig,
}

impl AnthropicProvider {
    pub fn new(api_key: SecretString, model_id: impl Into<String>) -> Self {
        let model_id = model_id.into();
        let context_window = if model_id.contains("opus") { 200_000 } else { 200_000 };
        AnthropicProvider {
            client: reqwest::Client::new(),
            api_key,
            info: ModelInfo {
                provider: ModelProvider::Anthropic,
                model_id,
                context_window,
                supports_tools: true,
                supports_streaming: true,
            },
            retry: RetryConfig::from_env(),
        }
    }

    fn message_to_wire(message: &Message) -> Value {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        let content = match &message.content {
            MessageContent::Text(text) => json!(text),
            MessageContent::Blocks(blocks) => {
                json!(blocks.iter().map(block_to_wire).collect::<Vec<_>>())
            }
        };
        json!({ "role": role, "content": content })
    }
}

fn block_to_wire(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Text { text } => json!({ "type": "text", "text": text }),
        ContentBlock::ToolUse { id, name, input } => {
            json!({ "type": "tool_use", "id": id, "name": name, "input": input })
        }
        ContentBlock::ToolResult { tool_use_id, content, is_error } => {
            json!({
                "type": "tool_result",
                "tool_use_id": tool_use_id,
                "content": content,
                "is_error": is_error,
            })
        }
    }
}

fn block_from_wire(value: &Value) -> Option<ContentBlock> {
    let block_type = value.get("type")?.as_str()?;
    match block_type {
        "text" => Some(ContentBlock::text(value.get("text")?.as_str()?.to_string())),
        "tool_use" => Some(ContentBlock::ToolUse {
            id: value.get("id")?.as_str()?.to_string(),
            name: value.get("name")?.as_str()?.to_string(),
            input: value.get("input").cloned().unwrap_or(json!({})),
        }),
        _ => None,
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
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
        let wire_messages: Vec<Value> = messages.iter().map(Self::message_to_wire).collect();

        let mut body = json!({
            "model": self.info.model_id,
            "system": system,
            "messages": wire_messages,
            "max_tokens": max_tokens,
            "temperature": temperature,
        });
        if let Some(tools) = tools {
            if !tools.is_empty() {
                body["tools"] = json!(tools
                    .iter()
                    .map(|t| json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.input_schema,
                    }))
                    .collect::<Vec<_>>());
            }
        }

        let response = with_retry(&self.retry, || {
            let body = body.clone();
            async {
                let resp = self
                    .client
                    .post(API_BASE)
                    .header("x-api-key", self.api_key.expose_secret())
                    .header("anthropic-version", API_VERSION)
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

        let blocks: Vec<ContentBlock> = response
            .get("content")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(block_from_wire).collect())
            .unwrap_or_default();

        let usage = response.get("usage").map(|u| Usage {
            input_tokens: u.get("input_tokens").and_then(Value::as_u64).unwrap_or(0) as u32,
            output_tokens: u.get("output_tokens").and_then(Value::as_u64).unwrap_or(0) as u32,
            total_tokens: (u.get("input_tokens").and_then(Value::as_u64).unwrap_or(0)
                + u.get("output_tokens").and_then(Value::as_u64).unwrap_or(0)) as u32,
        });

        Ok(AssistantMessage {
            content: MessageContent::Blocks(blocks),
            stop_reason: response.get("stop_reason").and_then(Value::as_str).map(String::from),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn block_from_wire_parses_text_and_tool_use() {
        let text = block_from_wire(&json!({"type": "text", "text": "hi"})).unwrap();
        assert!(matches!(text, ContentBlock::Text { .. }));

        let tool_use = block_from_wire(&json!({
            "type": "tool_use", "id": "t1", "name": "read_file", "input": {"path": "a.py"}
        }))
        .unwrap();
        assert!(matches!(tool_use, ContentBlock::ToolUse { .. }));
    }

    #[test]
    fn message_to_wire_preserves_role() {
        let message = Message::user_text("hello");
        let wire = AnthropicProvider::message_to_wire(&message);
        assert_eq!(wire["role"], "user");
    }
}
