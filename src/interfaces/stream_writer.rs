//! Stream part delivery interface.

use async_trait::async_trait;

use scorestream_client::StreamPart;

/// Errors delivering a part to the consumer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The consumer went away.
    #[error("Stream consumer closed")]
    Closed,

    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered, single-consumer sink for stream parts.
///
/// Parts must reach the consumer in the order they were written.
#[async_trait]
pub trait StreamWriter: Send + Sync {
    async fn write(&self, part: StreamPart) -> Result<(), TransportError>;
}
