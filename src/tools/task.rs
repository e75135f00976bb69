//! `run_validation` tool handler, a thin wrapper over
//! `crate::validation::run_validation`.

use super::{Tool, ToolExecutionResult};
use crate::error::Result;
use crate::validation::run_validation;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;

pub struct RunValidationTool {
    workdir: PathBuf,
    command: String,
}

impl RunValidationTool {
    pub fn new(workdir: PathBuf, command: impl Into<String>) -> Self {
        RunValidationTool { workdir, command: command.into() }
    }
}

#[async_trait]
impl Tool for RunValidationTool {
    fn name(&self) -> &str {
        "run_validation"
    }

    fn description(&self) -> &str {
        "Run the repository's configured validation command (tests/lint/type-check). \
         MUST be run, and must pass, before attempting completion."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _input: Value) -> Result<ToolExecutionResult> {
        let result = run_validation(&self.workdir, &self.command).await?;
        if result.passed {
            Ok(ToolExecutionResult::ok(format!("Validation passed.\n\n{}", result.output)))
        } else {
            Ok(ToolExecutionResult::error(format!(
                "Validation failed (exit {:?}).\n\n{}",
                result.exit_code, result.output
            )))
        }
    }
}
