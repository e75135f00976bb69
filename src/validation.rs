//! Validation (§6 "Validation"): runs the repository's configured check
//! command (tests, lint, type-check) and reports pass/fail plus captured
//! output, without interpreting *why* it failed — that's left to the LLM
//! and, when it recurs, to a reflection.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub command: String,
    pub output: String,
    pub exit_code: Option<i32>,
}

/// Run `command` (a full shell command, e.g. `"cargo test"`) inside
/// `workdir` and capture its combined outcome.
pub async fn run_validation(workdir: &Path, command: &str) -> Result<ValidationResult> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(workdir)
        .output()
        .await
        .map_err(Error::Io)?;

    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(ValidationResult {
        passed: output.status.success(),
        command: command.to_string(),
        output: combined,
        exit_code: output.status.code(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn passing_command_reports_passed() {
        let dir = tempdir().unwrap();
        let result = run_validation(dir.path(), "true").await.unwrap();
        assert!(result.passed);
    }

    #[tokio::test]
    async fn failing_command_reports_failed_with_output() {
        let dir = tempdir().unwrap();
        let result = run_validation(dir.path(), "echo boom 1>&2; false").await.unwrap();
        assert!(!result.passed);
        assert!(result.output.contains("boom"));
    }
}
