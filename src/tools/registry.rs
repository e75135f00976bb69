//! Tool dispatch, grounded on the teacher's `tools::registry::ToolRegistry`
//! but raising a structured `Error::UnknownTool` on dispatch miss (the
//! teacher's `Ok(ToolResult::failure(...))` swallows the condition the spec
//! requires to surface as an error) and reserving `attempt_completion` so it
//! can never be dispatched through the registry.

use super::{Tool, ToolExecutionResult};
use crate::agent::types::ToolDefinition;
use crate::error::{Error, Result};
use std::collections::HashMap;

pub const ATTEMPT_COMPLETION: &str = "attempt_completion";

pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry { tools: HashMap::new() }
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        assert_ne!(name, ATTEMPT_COMPLETION, "attempt_completion must not be registered as a dispatchable tool");
        self.tools.insert(name, Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Dispatch a tool call by name. Raises `Error::UnknownTool` (not a
    /// successful-but-failed `ToolExecutionResult`) when no handler is
    /// registered, and refuses to dispatch `attempt_completion` at all —
    /// the loop must intercept that name before calling `execute`.
    pub async fn execute(&self, name: &str, input: serde_json::Value) -> Result<ToolExecutionResult> {
        if name == ATTEMPT_COMPLETION {
            return Err(Error::Internal(
                "attempt_completion must be intercepted by the loop, never dispatched".to_string(),
            ));
        }
        match self.get(name) {
            Some(tool) => tool.execute(input).await,
            None => Err(Error::UnknownTool(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes input"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, input: Value) -> Result<ToolExecutionResult> {
            Ok(ToolExecutionResult::ok(input.to_string()))
        }
    }

    #[tokio::test]
    async fn unknown_tool_raises_structured_error() {
        let registry = ToolRegistry::new();
        let err = registry.execute("does_not_exist", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::UnknownTool(_)));
    }

    #[tokio::test]
    async fn attempt_completion_is_never_dispatched() {
        let registry = ToolRegistry::new();
        let err = registry.execute(ATTEMPT_COMPLETION, json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    #[should_panic]
    fn registering_attempt_completion_panics() {
        struct FakeCompletion;
        #[async_trait]
        impl Tool for FakeCompletion {
            fn name(&self) -> &str {
                ATTEMPT_COMPLETION
            }
            fn description(&self) -> &str {
                ""
            }
            fn input_schema(&self) -> Value {
                json!({})
            }
            async fn execute(&self, _input: Value) -> Result<ToolExecutionResult> {
                Ok(ToolExecutionResult::ok(""))
            }
        }
        let mut registry = ToolRegistry::new();
        registry.register(FakeCompletion);
    }

    #[tokio::test]
    async fn registered_tool_dispatches() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        let result = registry.execute("echo", json!({"a": 1})).await.unwrap();
        assert!(!result.is_error);
    }
}
