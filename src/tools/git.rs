//! Local VCS tool handlers: `create_branch` and `git_commit`, thin wrappers
//! over `crate::git::GitWorkspace`.

use super::{Tool, ToolExecutionResult};
use crate::error::{Error, Result};
use crate::git::GitWorkspace;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct CreateBranchTool {
    workspace: Arc<GitWorkspace>,
}

impl CreateBranchTool {
    pub fn new(workspace: Arc<GitWorkspace>) -> Self {
        CreateBranchTool { workspace }
    }
}

#[async_trait]
impl Tool for CreateBranchTool {
    fn name(&self) -> &str {
        "create_branch"
    }

    fn description(&self) -> &str {
        "Create and check out a new git branch for this task's changes"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "branch_name": { "type": "string" } },
            "required": ["branch_name"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolExecutionResult> {
        let branch_name = input
            .get("branch_name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("Missing 'branch_name' parameter".to_string()))?;
        self.workspace.create_branch(branch_name).await?;
        Ok(ToolExecutionResult::ok(format!("Created and checked out branch {}", branch_name))
            .with_metadata(json!({ "branch_name": branch_name })))
    }
}

pub struct GitCommitTool {
    workspace: Arc<GitWorkspace>,
    pushed: Mutex<bool>,
}

impl GitCommitTool {
    pub fn new(workspace: Arc<GitWorkspace>) -> Self {
        GitCommitTool { workspace, pushed: Mutex::new(false) }
    }
}

#[async_trait]
impl Tool for GitCommitTool {
    fn name(&self) -> &str {
        "git_commit"
    }

    fn description(&self) -> &str {
        "Stage and commit all current changes, then push the active branch"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": { "type": "string" },
                "branch_name": { "type": "string" }
            },
            "required": ["message", "branch_name"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolExecutionResult> {
        let message = input
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("Missing 'message' parameter".to_string()))?;
        let branch_name = input
            .get("branch_name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("Missing 'branch_name' parameter".to_string()))?;

        let commit_sha = self.workspace.commit_all(message).await?;
        self.workspace.push(branch_name).await?;
        *self.pushed.lock().await = true;
        Ok(ToolExecutionResult::ok(format!("Committed {} and pushed {}", commit_sha, branch_name))
            .with_metadata(json!({ "branch_name": branch_name })))
    }
}
