//! Error types for the agent.

use thiserror::Error;

/// Result type alias using the agent's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the agent
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An LLM provider returned a well-formed but unsuccessful response
    /// (non-2xx status, API-level error body)
    #[error("LLM provider API error: {0}")]
    ProviderApi(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unauthorized access
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Authentication with an external service failed
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Transient network failure, distinct from a well-formed HTTP error
    /// response (see `Http`)
    #[error("Network error: {0}")]
    Network(String),

    /// A dispatched tool call failed during execution
    #[error("Tool failure ({tool}): {message}")]
    ToolFailure { tool: String, message: String },

    /// Post-edit validation did not pass
    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    /// The agent loop hit its iteration ceiling without completing
    #[error("Loop exhausted after {0} iterations")]
    LoopExhausted(u32),

    /// A dispatched tool name has no registered handler
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl Error {
    /// Check if error is retryable. Explicit categories first, falling back
    /// to the same substring classification C10 uses for raw provider
    /// errors (`crate::retry::is_retryable_error`).
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimit(_) | Error::Timeout(_) | Error::Network(_) => true,
            Error::Authentication(_)
            | Error::InvalidInput(_)
            | Error::NotFound(_)
            | Error::Unauthorized(_)
            | Error::UnknownTool(_)
            | Error::ValidationFailure(_)
            | Error::LoopExhausted(_) => false,
            _ => crate::retry::is_retryable_error(&self.to_string()),
        }
    }

    /// Check if error is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::NotFound(_) | Error::Unauthorized(_)
        )
    }
}

