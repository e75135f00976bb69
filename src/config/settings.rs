//! Task-run settings: everything a single issue-to-PR run needs, assembled
//! from the environment. This supersedes the legacy `Config`'s channel/
//! storage/sandbox sections for this agent's purposes — those types remain
//! in the tree (see `types::channel`, `types::storage`, `types::sandbox`)
//! as teacher reference pending the final trim, but are not constructed by
//! this agent.

use super::types::provider::ProviderConfig;
use crate::agent::reflection::ReflectionConfig;
use crate::retry::RetryConfig;
use secrecy::SecretString;

/// Identifies the work-tracker issue driving this run.
#[derive(Debug, Clone)]
pub struct IssueTarget {
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
}

/// Everything needed to clone, edit, validate, and open a PR for one issue.
/// Deliberately not `Clone` — it owns the tracker token.
pub struct TaskSettings {
    pub provider: ProviderConfig,
    pub reflection: ReflectionConfig,
    pub retry: RetryConfig,
    pub tracker_token: SecretString,
    pub validation_command: String,
    pub max_trials: u32,
    pub max_iterations_per_trial: u32,
}

impl TaskSettings {
    /// Read every setting from the environment. `VALIDATION_COMMAND`
    /// defaults to `"true"` (a no-op pass) when unset so a run never fails
    /// purely for lack of configuration; `TRACKER_TOKEN` is mandatory since
    /// without it neither the issue nor the PR endpoints are reachable.
    pub fn from_env() -> Result<Self, String> {
        let provider = ProviderConfig::from_env()?;
        let tracker_token = std::env::var("TRACKER_TOKEN")
            .map(SecretString::from)
            .map_err(|_| "TRACKER_TOKEN must be set".to_string())?;
        let validation_command =
            std::env::var("VALIDATION_COMMAND").unwrap_or_else(|_| "true".to_string());
        let max_trials = std::env::var("AGENT_MAX_TRIALS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        let max_iterations_per_trial = std::env::var("AGENT_MAX_ITERATIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(25);

        Ok(TaskSettings {
            provider,
            reflection: ReflectionConfig::from_env(),
            retry: RetryConfig::from_env(),
            tracker_token,
            validation_command,
            max_trials,
            max_iterations_per_trial,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_tracker_token_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("TRACKER_TOKEN");
        std::env::set_var("LLM_PROVIDER", "ollama");
        assert!(TaskSettings::from_env().is_err());
        std::env::remove_var("LLM_PROVIDER");
    }

    #[test]
    fn validation_command_defaults_to_a_noop() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("LLM_PROVIDER", "ollama");
        std::env::set_var("TRACKER_TOKEN", "ghp_test");
        std::env::remove_var("VALIDATION_COMMAND");
        let settings = TaskSettings::from_env().unwrap();
        assert_eq!(settings.validation_command, "true");
        std::env::remove_var("LLM_PROVIDER");
        std::env::remove_var("TRACKER_TOKEN");
    }
}
