//! LLM Provider interface (C5): a single trait behind which three distinct
//! wire dialects are normalized into one block-based message shape.
//!
//! Grounded on `original_source/llm/provider.py`'s `ILLMProvider`/`ModelInfo`;
//! the teacher's `core::provider::LlmProvider` trait is the structural model
//! (dyn-safe, `async_trait`, a `ProviderMeta`-shaped info accessor) but its
//! OpenAI-style flat `GenerationOptions`/`LlmResponse`/`ToolCall` types are
//! replaced by the block-based `agent::types` shapes shared with the
//! Conversation Store, since those must round-trip through all three
//! dialects unchanged.

pub mod anthropic;
pub mod gemini;
pub mod ollama;

use crate::agent::types::{AssistantMessage, Message, ToolDefinition};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which backend a `ProviderConfig` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    Anthropic,
    Gemini,
    Ollama,
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelProvider::Anthropic => write!(f, "anthropic"),
            ModelProvider::Gemini => write!(f, "gemini"),
            ModelProvider::Ollama => write!(f, "ollama"),
        }
    }
}

/// Static facts about a selected model, surfaced for logging/diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub provider: ModelProvider,
    pub model_id: String,
    pub context_window: u32,
    pub supports_tools: bool,
    pub supports_streaming: bool,
}

/// Abstract interface every dialect implements. The loop (C6) only ever
/// talks to this trait — it never sees provider wire shapes.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn model_info(&self) -> &ModelInfo;

    /// Send one turn: system prompt, full message history, the tool
    /// definitions available this iteration (empty slice if none), sampling
    /// temperature, and a max-output-tokens cap. Returns the normalized
    /// response shape shared by all three dialects.
    async fn create_message(
        &self,
        system: &str,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<AssistantMessage>;

    /// Convenience form used by the reflection manager, which never needs
    /// tool calling. Default implementation just forwards with no tools.
    async fn generate(
        &self,
        system: &str,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<AssistantMessage> {
        self.create_message(system, messages, tools, temperature, max_tokens).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_provider_displays_lowercase() {
        assert_eq!(ModelProvider::Anthropic.to_string(), "anthropic");
        assert_eq!(ModelProvider::Gemini.to_string(), "gemini");
        assert_eq!(ModelProvider::Ollama.to_string(), "ollama");
    }
}
