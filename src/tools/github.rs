//! Work-tracker tool handlers: `post_comment` and `create_pull_request`,
//! thin wrappers over `crate::github::TrackerClient`.

use super::{Tool, ToolExecutionResult};
use crate::error::{Error, Result};
use crate::github::{PullRequestRequest, TrackerClient};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct PostCommentTool {
    client: Arc<TrackerClient>,
    owner: String,
    repo: String,
    issue_number: u64,
}

impl PostCommentTool {
    pub fn new(client: Arc<TrackerClient>, owner: impl Into<String>, repo: impl Into<String>, issue_number: u64) -> Self {
        PostCommentTool { client, owner: owner.into(), repo: repo.into(), issue_number }
    }
}

#[async_trait]
impl Tool for PostCommentTool {
    fn name(&self) -> &str {
        "post_comment"
    }

    fn description(&self) -> &str {
        "Post a comment on the work-tracker issue. Do not call this during normal execution \
         — only for a final status update after the task has concluded."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "body": { "type": "string" } },
            "required": ["body"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolExecutionResult> {
        let body = input
            .get("body")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("Missing 'body' parameter".to_string()))?;
        self.client.post_comment(&self.owner, &self.repo, self.issue_number, body).await?;
        Ok(ToolExecutionResult::ok("Comment posted"))
    }
}

pub struct CreatePullRequestTool {
    client: Arc<TrackerClient>,
    owner: String,
    repo: String,
    base_branch: String,
}

impl CreatePullRequestTool {
    pub fn new(client: Arc<TrackerClient>, owner: impl Into<String>, repo: impl Into<String>, base_branch: impl Into<String>) -> Self {
        CreatePullRequestTool { client, owner: owner.into(), repo: repo.into(), base_branch: base_branch.into() }
    }
}

#[async_trait]
impl Tool for CreatePullRequestTool {
    fn name(&self) -> &str {
        "create_pull_request"
    }

    fn description(&self) -> &str {
        "Open a pull request for the current branch against the default branch"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "body": { "type": "string" },
                "branch": { "type": "string", "description": "The branch containing the committed changes" }
            },
            "required": ["title", "body", "branch"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolExecutionResult> {
        let title = input.get("title").and_then(Value::as_str).ok_or_else(|| Error::InvalidInput("Missing 'title'".to_string()))?;
        let body = input.get("body").and_then(Value::as_str).ok_or_else(|| Error::InvalidInput("Missing 'body'".to_string()))?;
        let branch = input.get("branch").and_then(Value::as_str).ok_or_else(|| Error::InvalidInput("Missing 'branch'".to_string()))?;

        let request = PullRequestRequest { title, body, head: branch, base: &self.base_branch };
        let pr = self.client.open_pull_request(&self.owner, &self.repo, &request).await?;
        Ok(ToolExecutionResult::ok(format!("Opened pull request #{}: {}", pr.number, pr.html_url))
            .with_metadata(json!({ "pr_url": pr.html_url })))
    }
}
