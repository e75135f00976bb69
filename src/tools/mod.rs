//! Tool Registry & Dispatcher (C3): named handlers the agent loop can call,
//! each exposing an Anthropic-style `{name, description, input_schema}`
//! definition. Grounded on the teacher's `tools::traits::Tool`/`ToolRegistry`
//! shape, generalized to the block-based `ToolDefinition` in `agent::types`
//! and the spec's dispatch contract (structured "unknown tool" error,
//! `attempt_completion` reserved for loop interception).

pub mod file;
pub mod git;
pub mod github;
pub mod registry;
pub mod task;

pub use registry::ToolRegistry;

use async_trait::async_trait;
use crate::agent::types::ToolDefinition;
use crate::error::Result;
use serde_json::Value;

/// Outcome of dispatching one tool call, fed back into the conversation as
/// a `tool_result` block. `metadata` carries the structured facts (a
/// written path, a new branch name, an opened PR url, ...) the loop's
/// context-update rules (§4.6) need without having to re-parse `output`.
#[derive(Debug, Clone)]
pub struct ToolExecutionResult {
    pub output: String,
    pub is_error: bool,
    pub metadata: Value,
}

impl ToolExecutionResult {
    pub fn ok(output: impl Into<String>) -> Self {
        ToolExecutionResult { output: output.into(), is_error: false, metadata: Value::Null }
    }

    pub fn error(output: impl Into<String>) -> Self {
        ToolExecutionResult { output: output.into(), is_error: true, metadata: Value::Null }
    }

    /// Attach structured metadata to an otherwise-built result.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A tool the dispatcher can invoke by name. `attempt_completion` is never
/// given a `Tool` impl — it's intercepted by the loop before reaching the
/// registry (§4.3).
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> Value;

    async fn execute(&self, input: Value) -> Result<ToolExecutionResult>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}
