//! File read/write tools, grounded on the teacher's
//! `tools::read_file::ReadFileTool`/`tools::write_file::WriteFileTool`
//! (kept: the `allowed_dir` path-confinement check).

use super::{Tool, ToolExecutionResult};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};

/// Join `path` onto `allowed_dir`, rejecting it outright if any component is
/// `..` or an absolute root — checked before joining, since `Path::starts_with`
/// on an unresolved joined path does not catch `..` segments (the OS would
/// still follow them at open time).
fn resolve_within(allowed_dir: &Path, path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    for component in candidate.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(Error::InvalidInput(format!("path '{}' escapes the workspace", path))),
        }
    }
    Ok(allowed_dir.join(candidate))
}

pub struct ReadFileTool {
    allowed_dir: PathBuf,
}

impl ReadFileTool {
    pub fn new(allowed_dir: PathBuf) -> Self {
        ReadFileTool { allowed_dir }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        resolve_within(&self.allowed_dir, path)
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file in the cloned repository"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path relative to the repository root" }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolExecutionResult> {
        let path = input
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("Missing 'path' parameter".to_string()))?;
        let full_path = self.resolve(path)?;

        match tokio::fs::read_to_string(&full_path).await {
            Ok(content) => Ok(ToolExecutionResult::ok(content).with_metadata(json!({ "file_path": path }))),
            Err(e) => Ok(ToolExecutionResult::error(format!("Failed to read {}: {}", path, e))),
        }
    }
}

pub struct WriteFileTool {
    allowed_dir: PathBuf,
}

impl WriteFileTool {
    pub fn new(allowed_dir: PathBuf) -> Self {
        WriteFileTool { allowed_dir }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        resolve_within(&self.allowed_dir, path)
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create or overwrite a file in the cloned repository"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path relative to the repository root" },
                "content": { "type": "string", "description": "Full file content to write" }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolExecutionResult> {
        let path = input
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("Missing 'path' parameter".to_string()))?;
        let content = input
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("Missing 'content' parameter".to_string()))?;
        let full_path = self.resolve(path)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Error::Io)?;
        }
        match tokio::fs::write(&full_path, content).await {
            Ok(()) => Ok(ToolExecutionResult::ok(format!("Wrote {} bytes to {}", content.len(), path))
                .with_metadata(json!({ "file_path": path }))),
            Err(e) => Ok(ToolExecutionResult::error(format!("Failed to write {}: {}", path, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let writer = WriteFileTool::new(dir.path().to_path_buf());
        let reader = ReadFileTool::new(dir.path().to_path_buf());

        let write_result = writer.execute(json!({"path": "a.txt", "content": "hello"})).await.unwrap();
        assert!(!write_result.is_error);

        let read_result = reader.execute(json!({"path": "a.txt"})).await.unwrap();
        assert_eq!(read_result.output, "hello");
    }

    #[tokio::test]
    async fn path_escaping_workspace_is_rejected() {
        let dir = tempdir().unwrap();
        let reader = ReadFileTool::new(dir.path().to_path_buf());
        let err = reader.execute(json!({"path": "../../etc/passwd"})).await;
        assert!(err.is_err() || err.unwrap().is_error);
    }
}
