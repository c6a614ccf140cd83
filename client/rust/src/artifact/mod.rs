//! Artifact state machine.
//!
//! Applies stream parts, in arrival order, to a versioned document plus its
//! metadata. Applying a part is synchronous and never blocks.
//!
//! ```text
//! idle      --clear-->    streaming   (displayed content reset, history untouched)
//! streaming --content-->  streaming   (draft overwritten, artifact visible)
//! streaming --metadata--> streaming   (safe merge)
//! streaming --finish-->   idle        (draft committed if changed)
//! ```
//!
//! Intermediate `content` parts never create versions; only `finish` does,
//! so a request adds at most one version however many deltas it produced.

mod consume;

pub use consume::ConsumeSummary;

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::diagnostics::{Diagnostic, SharedDiagnostics, TracingDiagnostics};
use crate::document::Document;
use crate::error::{ClientError, Result};
use crate::history::Navigation;
use crate::metadata::{MetadataFragment, MusicMetadata, RejectedField};
use crate::part::{DecodedPart, StreamPart};

/// Whether a generation request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    Idle,
    Streaming,
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationStatus::Idle => f.write_str("idle"),
            GenerationStatus::Streaming => f.write_str("streaming"),
        }
    }
}

/// What applying one part did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// idle -> streaming.
    Started,
    /// `clear` while already streaming.
    DraftReset,
    /// Draft buffer overwritten.
    DraftUpdated,
    /// Metadata fragment merged.
    MetadataMerged { changed: bool },
    /// streaming -> idle with a new or filled version.
    Committed { version_index: usize },
    /// streaming -> idle with nothing new to commit.
    Finished,
    /// `finish` with no request in flight.
    Ignored,
}

/// Scratch copy of the latest content while editing locally.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EditSession {
    scratch: String,
}

/// Live document state on the consuming side.
pub struct ArtifactState {
    document: Document,
    metadata: MusicMetadata,
    status: GenerationStatus,
    draft: Option<String>,
    visible: bool,
    edit: Option<EditSession>,
    diagnostics: SharedDiagnostics,
}

impl fmt::Debug for ArtifactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactState")
            .field("document", &self.document)
            .field("metadata", &self.metadata)
            .field("status", &self.status)
            .field("draft", &self.draft)
            .field("visible", &self.visible)
            .field("editing", &self.edit.is_some())
            .finish()
    }
}

impl ArtifactState {
    /// Wrap a document with default metadata, idle.
    pub fn new(document: Document) -> Self {
        Self {
            document,
            metadata: MusicMetadata::default(),
            status: GenerationStatus::Idle,
            draft: None,
            visible: false,
            edit: None,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn with_metadata(mut self, metadata: MusicMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: SharedDiagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn metadata(&self) -> &MusicMetadata {
        &self.metadata
    }

    pub fn status(&self) -> GenerationStatus {
        self.status
    }

    pub fn is_streaming(&self) -> bool {
        self.status == GenerationStatus::Streaming
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// In-flight content, if a request is streaming.
    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    /// What the view should show: the live draft while streaming, otherwise
    /// the version under the navigation cursor.
    pub fn displayed_content(&self) -> &str {
        match &self.draft {
            Some(draft) => draft,
            None => self.document.current_content(),
        }
    }

    /// Apply one part. Never fails; unexpected parts degrade to no-ops.
    pub fn apply(&mut self, part: StreamPart) -> Transition {
        match part {
            StreamPart::Clear(title) => {
                debug!(%title, "Clearing displayed content");
                self.discard_edit();
                self.draft = Some(String::new());
                match self.status {
                    GenerationStatus::Idle => {
                        self.status = GenerationStatus::Streaming;
                        Transition::Started
                    }
                    GenerationStatus::Streaming => Transition::DraftReset,
                }
            }
            StreamPart::Content(content) => {
                let started = self.status == GenerationStatus::Idle;
                if started {
                    debug!("Content without clear; starting stream");
                    self.discard_edit();
                    self.status = GenerationStatus::Streaming;
                }
                self.draft = Some(content);
                self.visible = true;
                if started {
                    Transition::Started
                } else {
                    Transition::DraftUpdated
                }
            }
            StreamPart::Metadata(fragment) => self.merge_metadata(&fragment),
            StreamPart::Finish => self.finish(),
        }
    }

    /// Apply a decoded part, reporting any metadata fields dropped on decode.
    pub fn apply_decoded(&mut self, decoded: DecodedPart) -> Transition {
        self.report_rejected(&decoded.rejected);
        self.apply(decoded.part)
    }

    /// Abandon an in-flight request without committing anything.
    ///
    /// Used when the stream ends or breaks before `finish`.
    pub fn abort(&mut self) -> bool {
        if self.status == GenerationStatus::Idle {
            return false;
        }
        debug!("Aborting in-flight request; draft discarded");
        self.status = GenerationStatus::Idle;
        self.draft = None;
        true
    }

    fn merge_metadata(&mut self, fragment: &MetadataFragment) -> Transition {
        let changed = self.metadata.merge(fragment);
        Transition::MetadataMerged { changed }
    }

    fn finish(&mut self) -> Transition {
        if self.status == GenerationStatus::Idle {
            return Transition::Ignored;
        }
        self.status = GenerationStatus::Idle;

        let draft = self.draft.take().unwrap_or_default();
        if self.document.history.commit(draft, Utc::now()) {
            Transition::Committed {
                version_index: self.document.history.current_version_index(),
            }
        } else {
            Transition::Finished
        }
    }

    fn report_rejected(&self, rejected: &[RejectedField]) {
        for field in rejected {
            self.diagnostics.emit(Diagnostic::MetadataFieldRejected {
                field: field.field.clone(),
                reason: field.reason.to_string(),
            });
        }
    }

    pub(crate) fn diagnostics(&self) -> &SharedDiagnostics {
        &self.diagnostics
    }

    // --- Navigation ---

    pub fn previous(&mut self) -> Navigation {
        self.document.history.previous()
    }

    pub fn next(&mut self) -> Navigation {
        self.document.history.next()
    }

    pub fn can_previous(&self) -> bool {
        self.document.history.can_previous()
    }

    pub fn can_next(&self) -> bool {
        self.document.history.can_next()
    }

    pub fn is_viewing_latest(&self) -> bool {
        self.document.history.is_viewing_latest()
    }

    // --- Local editing ---

    /// True when an edit session could be opened right now.
    pub fn can_edit(&self) -> bool {
        self.status == GenerationStatus::Idle && self.is_viewing_latest() && self.edit.is_none()
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    /// Open an edit session on a scratch copy of the latest content.
    pub fn begin_edit(&mut self) -> Result<()> {
        self.check_editable()?;
        if self.edit.is_some() {
            return Err(ClientError::AlreadyEditing);
        }
        self.edit = Some(EditSession {
            scratch: self.document.latest_content().to_string(),
        });
        Ok(())
    }

    pub fn edit_content(&self) -> Option<&str> {
        self.edit.as_ref().map(|e| e.scratch.as_str())
    }

    pub fn edit_content_mut(&mut self) -> Option<&mut String> {
        self.edit.as_mut().map(|e| &mut e.scratch)
    }

    pub fn set_edit_content(&mut self, content: impl Into<String>) -> Result<()> {
        let session = self.edit.as_mut().ok_or(ClientError::NotEditing)?;
        session.scratch = content.into();
        Ok(())
    }

    /// Commit the scratch copy as a new version. Returns true if a version
    /// was added (unchanged content closes the session without one).
    ///
    /// Empty content is rejected and the session stays open.
    pub fn save_edit(&mut self) -> Result<bool> {
        let Some(session) = &self.edit else {
            return Err(ClientError::NotEditing);
        };
        if session.scratch.trim().is_empty() {
            return Err(ClientError::EmptyContent);
        }
        self.check_editable()?;
        let Some(session) = self.edit.take() else {
            return Err(ClientError::NotEditing);
        };
        Ok(self.document.history.commit(session.scratch, Utc::now()))
    }

    /// Discard the scratch copy. No other state changes.
    pub fn cancel_edit(&mut self) -> Result<()> {
        self.edit.take().map(|_| ()).ok_or(ClientError::NotEditing)
    }

    fn check_editable(&self) -> Result<()> {
        if self.status != GenerationStatus::Idle {
            return Err(ClientError::Busy(self.status));
        }
        if !self.is_viewing_latest() {
            return Err(ClientError::NotViewingLatest {
                viewing: self.document.history.current_version_index(),
                latest: self.document.history.latest_index(),
            });
        }
        Ok(())
    }

    fn discard_edit(&mut self) {
        if self.edit.take().is_some() {
            debug!("Generation started; discarding open edit session");
        }
    }
}
