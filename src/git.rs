//! Local-clone VCS operations (§6 "Local clone"): shells out to the system
//! `git` binary, mirroring the teacher's preference for the `which` crate
//! to locate external executables rather than embedding a VCS library.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub struct GitWorkspace {
    repo_dir: PathBuf,
}

impl GitWorkspace {
    /// Clone `remote_url` into `repo_dir`, replacing anything already there.
    pub async fn clone(remote_url: &str, repo_dir: impl Into<PathBuf>) -> Result<Self> {
        let repo_dir = repo_dir.into();
        if repo_dir.exists() {
            tokio::fs::remove_dir_all(&repo_dir).await.map_err(Error::Io)?;
        }
        run_git(None, &["clone", remote_url, &repo_dir.to_string_lossy()]).await?;
        Ok(GitWorkspace { repo_dir })
    }

    pub fn path(&self) -> &Path {
        &self.repo_dir
    }

    pub async fn create_branch(&self, branch_name: &str) -> Result<()> {
        run_git(Some(&self.repo_dir), &["checkout", "-b", branch_name]).await.map(|_| ())
    }

    pub async fn commit_all(&self, message: &str) -> Result<String> {
        run_git(Some(&self.repo_dir), &["add", "-A"]).await?;
        run_git(Some(&self.repo_dir), &["commit", "-m", message]).await?;
        let output = run_git(Some(&self.repo_dir), &["rev-parse", "HEAD"]).await?;
        Ok(output.trim().to_string())
    }

    pub async fn push(&self, branch_name: &str) -> Result<()> {
        run_git(Some(&self.repo_dir), &["push", "-u", "origin", branch_name]).await.map(|_| ())
    }

    pub async fn diff_stat(&self) -> Result<String> {
        run_git(Some(&self.repo_dir), &["diff", "--stat", "HEAD"]).await
    }
}

async fn run_git(cwd: Option<&Path>, args: &[&str]) -> Result<String> {
    let mut command = Command::new("git");
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    let output = command.output().await.map_err(Error::Io)?;
    if !output.status.success() {
        return Err(Error::ToolFailure {
            tool: "git".to_string(),
            message: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
