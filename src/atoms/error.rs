// ── Paw Atoms: Error Types ─────────────────────────────────────────────────
// Single canonical error enum for the voice engine, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (Backend, Action, Config…).
//   • Classification and output parsing never produce an error; only the
//     generative backend and the action executors cross this boundary.
//   • No variant carries secret material (API keys) in its message.

use std::time::Duration;
use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// Generative backend unreachable, rejected the request, or broke mid-stream.
    #[error("Backend error: {backend}: {message}")]
    Backend { backend: String, message: String },

    /// The generative call exceeded its configured bound.
    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled an in-flight generative call.
    #[error("Generation cancelled")]
    Cancelled,

    /// An action executor reported a failure.
    #[error("Action error: {action}: {message}")]
    Action { action: String, message: String },

    /// Engine configuration is invalid or unreadable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reminder / task repository failure.
    #[error("Repository error: {0}")]
    Repository(String),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP / network failure (reqwest layer).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for errors that do not yet have a dedicated variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenience constructors ───────────────────────────────────────────────

impl EngineError {
    /// Create a backend error with name and message.
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend { backend: backend.into(), message: message.into() }
    }

    /// Create an action error with name and message.
    pub fn action(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Action { action: action.into(), message: message.into() }
    }

    /// True for failures caused by the generative backend or its time bound.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            EngineError::Backend { .. } | EngineError::Timeout(_) | EngineError::Network(_)
        )
    }
}

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Other(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All fallible engine operations return this type.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for String {
    fn from(e: EngineError) -> Self {
        e.to_string()
    }
}
