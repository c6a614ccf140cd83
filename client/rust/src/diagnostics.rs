//! Structured diagnostics.
//!
//! Recovery never depends on diagnostics: the orchestrator and reducer decide
//! what to do first, then report what happened to a [`DiagnosticSink`] the
//! host application can observe.

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Which request shape a generation diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Create,
    Update,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMode::Create => f.write_str("create"),
            GenerationMode::Update => f.write_str("update"),
        }
    }
}

/// An observable event about an absorbed failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The backend raised; the orchestrator substituted content.
    GenerationFailed {
        mode: GenerationMode,
        error: String,
        content_parts: usize,
    },
    /// The backend finished without producing any content.
    EmptyGeneration { mode: GenerationMode },
    /// A placeholder score was emitted in place of generated content.
    PlaceholderEmitted { title: String },
    /// The consumer saw a part tag outside the protocol.
    UnknownPart { tag: String },
    /// The consumer could not decode an envelope.
    MalformedPart { error: String },
    /// A metadata field was dropped by the safe merge.
    MetadataFieldRejected { field: String, reason: String },
    /// The renderer failed; the displayed view shows an error instead.
    RenderFailed { error: String },
}

/// Receives diagnostics. Implementations must not block.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Shared handle to a sink.
pub type SharedDiagnostics = Arc<dyn DiagnosticSink>;

/// Default sink: logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::GenerationFailed {
                mode,
                error,
                content_parts,
            } => warn!(%mode, %error, content_parts, "Generation failed; fallback applied"),
            Diagnostic::EmptyGeneration { mode } => {
                warn!(%mode, "Generation produced no content")
            }
            Diagnostic::PlaceholderEmitted { title } => {
                debug!(%title, "Placeholder score emitted")
            }
            Diagnostic::UnknownPart { tag } => debug!(%tag, "Ignoring unknown stream part"),
            Diagnostic::MalformedPart { error } => warn!(%error, "Dropping malformed stream part"),
            Diagnostic::MetadataFieldRejected { field, reason } => {
                debug!(%field, %reason, "Metadata field rejected")
            }
            Diagnostic::RenderFailed { error } => warn!(%error, "Render failed"),
        }
    }
}

/// Channel capacity for broadcast diagnostics.
const CHANNEL_CAPACITY: usize = 256;

/// Fans diagnostics out over a tokio broadcast channel.
///
/// Diagnostics emitted with no live subscriber are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastDiagnostics {
    sender: broadcast::Sender<Diagnostic>,
}

impl BroadcastDiagnostics {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Diagnostic> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for BroadcastDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        let _ = self.sender.send(diagnostic);
    }
}

/// Keeps every diagnostic in memory. Intended for tests.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    recorded: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<Diagnostic> {
        self.recorded
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        if let Ok(mut guard) = self.recorded.lock() {
            guard.push(diagnostic);
        }
    }
}
