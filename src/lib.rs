//! scorestream - streamed generation of versioned music-score artifacts
//!
//! Server side of the artifact protocol: a generation backend produces a
//! structured score object incrementally, the orchestrator turns each
//! snapshot into ordered `content`/`metadata` parts, and the document service
//! persists every finished generation as a new version.
//!
//! The consumer side (artifact state machine, version history, rendering)
//! lives in the `scorestream-client` crate.

pub mod backend;
pub mod config;
pub mod generation;
pub mod interfaces;
pub mod orchestration;
pub mod storage;
pub mod transport;
pub mod utils;

pub use orchestration::{
    DocumentService, DocumentSummary, GenerationRequest, Orchestrator, ServiceError,
};
