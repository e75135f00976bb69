//! Agent module: the LLM-facing conversation, prompt assembly, and the
//! reflection-augmented task loop built on top of them.
//!
//! Tool handlers live in `crate::tools`; LLM provider dialects live in
//! `crate::llm`. This module is the layer that ties the two together into
//! one autonomous run.

pub mod conversation;
pub mod prompts;
pub mod reflection;
pub mod task;
pub mod types;

pub use conversation::Conversation;
pub use prompts::PromptBuilder;
pub use reflection::{ReflectionConfig, ReflectionManager, ReflectionMemory, ReflectionRecord, ReflectionTrigger};
pub use task::{AgentTask, TaskOutcome, TrialOutcome};
pub use types::*;
