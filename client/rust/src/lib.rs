//! Client side of the scorestream generation protocol.
//!
//! This crate owns the wire types shared with the server and everything a
//! consumer needs to turn a stream of parts into a live, versioned score.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scorestream_client::{ArtifactState, Document, DocumentKind, StreamPart};
//! use uuid::Uuid;
//!
//! let doc = Document::new(Uuid::new_v4(), "Scale", DocumentKind::Music);
//! let mut state = ArtifactState::new(doc);
//!
//! state.apply(StreamPart::Clear("Scale".into()));
//! state.apply(StreamPart::Content("X:1\nK:C\nCDEF|".into()));
//! state.apply(StreamPart::Finish);
//!
//! assert_eq!(state.document().history.len(), 1);
//! ```
//!
//! Feeding a transport instead of individual parts:
//!
//! ```rust,ignore
//! let summary = state.consume(receiver_stream).await;
//! ```

pub mod artifact;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod history;
pub mod metadata;
pub mod part;
pub mod render;

pub use artifact::{ArtifactState, ConsumeSummary, GenerationStatus, Transition};
pub use diagnostics::{
    BroadcastDiagnostics, Diagnostic, DiagnosticSink, GenerationMode, RecordingDiagnostics,
    SharedDiagnostics, TracingDiagnostics,
};
pub use document::{Document, DocumentKind, UnknownKind};
pub use error::{ClientError, Result};
pub use history::{DocumentVersion, InvalidHistory, Navigation, VersionHistory};
pub use metadata::{DecodedFragment, MetadataFragment, MusicMetadata, RejectedField};
pub use part::{decode_line, encode_line, DecodedPart, Envelope, PartDecodeError, StreamPart};
pub use render::{AbcHeaderRenderer, RenderError, RenderedView, Renderer, RendererHandle, ScoreView};
