//! Configuration: environment-driven settings for the agent.
//!
//! - `types::provider`: which LLM dialect to speak and with what credentials
//! - `settings`: the aggregate `TaskSettings` a single issue-to-PR run needs

pub mod settings;
pub mod types;

// Task-run settings (this agent's actual configuration surface)
pub use settings::{IssueTarget, TaskSettings};

// Provider dialect selection
pub use types::provider::{ProviderConfig as LlmDialectConfig, ProviderKind};
