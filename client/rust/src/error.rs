//! Error types for the scorestream client library.

use crate::artifact::GenerationStatus;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised by local (non-streaming) operations on an artifact.
///
/// Stream parts never produce these: the reducer absorbs malformed input.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An edit was requested while a generation is in flight.
    #[error("cannot edit while {0}")]
    Busy(GenerationStatus),

    /// An edit was requested while viewing an older version.
    #[error("edits are only permitted on the latest version (viewing {viewing} of {latest})")]
    NotViewingLatest { viewing: usize, latest: usize },

    /// Save or cancel without an open edit session.
    #[error("no edit session is open")]
    NotEditing,

    /// A second edit session was requested.
    #[error("an edit session is already open")]
    AlreadyEditing,

    /// Save with an empty scratch copy. The session stays open.
    #[error("cannot save empty content")]
    EmptyContent,
}

impl ClientError {
    /// Returns true if the operation may succeed once the artifact is idle.
    pub fn is_busy(&self) -> bool {
        matches!(self, ClientError::Busy(_))
    }
}
