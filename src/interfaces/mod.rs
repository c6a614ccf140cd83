//! Abstract interfaces for scorestream components.
//!
//! These traits define the contracts for:
//! - Generation backends (structured-output model calls)
//! - Document storage (persistence)
//! - Stream writers (delivering parts to a consumer)

pub mod backend;
pub mod document_store;
pub mod stream_writer;

pub use backend::{BackendError, DeltaStream, GenerationBackend, GenerationCall, PartialObjectDelta};
pub use document_store::{DocumentStore, StorageError};
pub use stream_writer::{StreamWriter, TransportError};
