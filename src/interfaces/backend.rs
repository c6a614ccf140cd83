//! Generation backend interface.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors raised by a generation backend, either when starting a call or
/// mid-stream.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Backend stream error: {0}")]
    Stream(String),

    #[error("Malformed backend event: {0}")]
    Protocol(String),

    #[error("Backend misconfigured: {0}")]
    Config(String),

    #[error("Scripted failure: {0}")]
    Scripted(String),
}

impl BackendError {
    /// Returns true if retrying the same call may succeed.
    ///
    /// Retryable:
    /// - connect failures and timeouts
    /// - HTTP 429 and 5xx (including 529 overloaded)
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Http(e) => e.is_connect() || e.is_timeout(),
            BackendError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// One raw increment from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialObjectDelta {
    /// A fragment of the JSON text of the object being generated.
    TextDelta(String),
    /// The backend finished producing the object.
    Finish,
}

/// Lazy, single-pass, fallible sequence of deltas.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<PartialObjectDelta>> + Send>>;

/// A structured-generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCall {
    /// JSON Schema the generated object must satisfy.
    pub schema: Value,
    pub system: String,
    pub prompt: String,
}

/// Interface for structured-output generation.
///
/// Implementations:
/// - `AnthropicBackend`: Anthropic Messages API with a forced tool call
/// - `ScriptedBackend`: replays a recorded script of deltas and failures
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Start a generation. Errors here are failures before the first delta.
    async fn generate(&self, call: &GenerationCall) -> Result<DeltaStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_retryable() {
        let overloaded = BackendError::Status {
            status: 529,
            body: "overloaded".to_string(),
        };
        let throttled = BackendError::Status {
            status: 429,
            body: String::new(),
        };
        let bad_request = BackendError::Status {
            status: 400,
            body: "invalid schema".to_string(),
        };

        assert!(overloaded.is_retryable());
        assert!(throttled.is_retryable());
        assert!(!bad_request.is_retryable());
    }

    #[test]
    fn test_stream_errors_not_retryable() {
        assert!(!BackendError::Stream("connection reset".to_string()).is_retryable());
        assert!(!BackendError::Scripted("boom".to_string()).is_retryable());
    }
}
