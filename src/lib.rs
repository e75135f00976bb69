//! # tarsis
//!
//! An autonomous coding agent: given a work-tracker issue, it drives an LLM
//! through a tool-mediated loop — read the issue, explore the repository,
//! edit files, validate, commit, open a pull request — with a
//! Reflexion-style self-improvement layer on top (bounded reflection
//! memory, trigger-based self-critique, multi-trial retry with preserved
//! learning across trials).
//!
//! ## Architecture
//!
//! - **Agent** (`agent`): conversation store, prompt builder, reflection
//!   memory/manager, and the trial-controller-wrapped task loop
//! - **LLM providers** (`llm`): one trait, three wire dialects (Anthropic,
//!   Gemini, Ollama)
//! - **Tools** (`tools`): the dispatchable tool registry (file I/O, git,
//!   the work tracker, validation) plus the loop-intercepted
//!   `attempt_completion`
//! - **Configuration** (`config`): environment-driven settings for the
//!   above
//! - **Persistence** (`repository`): the filesystem-backed reflection cache
//! - **Ambient stack** (`retry`, `errors`, `github`, `git`, `validation`):
//!   backoff policy, error categorization/formatting, and the thin
//!   work-tracker/VCS/validation-command clients the tools wrap
//!
//! Framework machinery unrelated to this agent (chat channels, vector
//! storage, container/Wasm sandboxes, plugin SDK) was trimmed; every module
//! below is load-bearing for the issue-to-PR flow.

// Agent logic: conversation, prompts, reflection, and the task loop
pub mod agent;

// Modular configuration (now a directory module)
#[path = "config/mod.rs"]
pub mod config;

// LLM provider dialects (Anthropic, Gemini, Ollama) behind one trait
pub mod llm;

// Tool registry and handlers
pub mod tools;

// Persistent, filesystem-backed state (reflection cache)
pub mod repository;

// Retry/backoff policy
pub mod retry;

// Error categorization and user-facing formatting
pub mod errors;

// Work-tracker HTTP client
pub mod github;

// Local-clone VCS operations
pub mod git;

// Validation command runner
pub mod validation;

// Webhook payload parsing and dispatch
pub mod webhook;

// Tracing/log initialization shared by the binaries
pub mod logging;

// Error types
pub mod error;

// Re-export commonly used items
pub use error::{Error, Result};
pub use agent::{AgentTask, Conversation, TaskOutcome};
pub use config::{IssueTarget, TaskSettings};
pub use llm::LlmProvider;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
