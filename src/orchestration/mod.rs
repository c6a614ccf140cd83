//! Generation orchestration.
//!
//! `Orchestrator` turns one structured-generation call into an ordered
//! sequence of stream parts and always produces a usable final content:
//!
//! - create mode falls back to a placeholder score
//! - update mode falls back to the unchanged existing content
//!
//! Backend failures are absorbed and reported as diagnostics. Only transport
//! failures (the consumer went away) are returned.
//!
//! - `document`: create/update flows that wrap a run with `clear`/`finish`
//!   and persist the result

pub mod document;

use std::sync::Arc;

use tracing::{debug, info};

use scorestream_client::{
    Diagnostic, GenerationMode, MetadataFragment, SharedDiagnostics, StreamPart,
    TracingDiagnostics,
};

use crate::generation::prompts::{update_system_prompt, CREATE_SYSTEM_PROMPT};
use crate::generation::schema::score_schema;
use crate::generation::{extract, placeholder_score, PartialObjectDecoder};
use crate::interfaces::{BackendError, GenerationBackend, GenerationCall, StreamWriter, TransportError};

pub use document::{DocumentService, DocumentSummary, ServiceError};

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    /// Generate a new score from its title.
    Create { title: String },
    /// Revise existing content according to a description of the changes.
    Update {
        description: String,
        existing_content: String,
    },
}

impl GenerationRequest {
    pub fn mode(&self) -> GenerationMode {
        match self {
            GenerationRequest::Create { .. } => GenerationMode::Create,
            GenerationRequest::Update { .. } => GenerationMode::Update,
        }
    }

    /// Backend call for this request.
    pub fn call(&self) -> GenerationCall {
        match self {
            GenerationRequest::Create { title } => GenerationCall {
                schema: score_schema(GenerationMode::Create),
                system: CREATE_SYSTEM_PROMPT.to_string(),
                prompt: title.clone(),
            },
            GenerationRequest::Update {
                description,
                existing_content,
            } => GenerationCall {
                schema: score_schema(GenerationMode::Update),
                system: update_system_prompt(existing_content, description),
                prompt: description.clone(),
            },
        }
    }
}

/// Drives a backend and writes parts in extraction order.
pub struct Orchestrator {
    backend: Arc<dyn GenerationBackend>,
    diagnostics: SharedDiagnostics,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: SharedDiagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn diagnostics(&self) -> &SharedDiagnostics {
        &self.diagnostics
    }

    /// Run one generation, writing `content` and `metadata` parts.
    ///
    /// Returns the final content. Does not write `clear` or `finish`; the
    /// caller brackets the run.
    #[tracing::instrument(name = "orchestrator.run", skip_all, fields(mode = %request.mode()))]
    pub async fn run(
        &self,
        request: &GenerationRequest,
        writer: &dyn StreamWriter,
    ) -> Result<String, TransportError> {
        let mode = request.mode();
        let deltas = match self.backend.generate(&request.call()).await {
            Ok(deltas) => deltas,
            Err(e) => return self.recover(request, writer, e, 0).await,
        };

        let mut decoder = PartialObjectDecoder::new(deltas);
        let mut draft = String::new();
        let mut content_parts = 0usize;

        while let Some(next) = decoder.next_object().await {
            let object = match next {
                Ok(object) => object,
                Err(e) => return self.recover(request, writer, e, content_parts).await,
            };
            let extraction = extract(&object);

            if let Some(content) = extraction.content.filter(|c| !c.is_empty()) {
                writer.write(StreamPart::Content(content.clone())).await?;
                draft = content;
                content_parts += 1;
            }

            if let Some(metadata) = extraction.metadata {
                let decoded = MetadataFragment::decode(&metadata);
                for rejected in decoded.rejected {
                    self.diagnostics.emit(Diagnostic::MetadataFieldRejected {
                        field: rejected.field,
                        reason: rejected.reason.to_string(),
                    });
                }
                writer.write(StreamPart::Metadata(decoded.fragment)).await?;
            }
        }

        if draft.is_empty() {
            self.diagnostics.emit(Diagnostic::EmptyGeneration { mode });
            return match request {
                GenerationRequest::Create { title } => {
                    self.emit_placeholder(title, writer).await
                }
                GenerationRequest::Update {
                    existing_content, ..
                } => {
                    debug!("Update produced no content; keeping existing");
                    Ok(existing_content.clone())
                }
            };
        }

        info!(content_parts, bytes = draft.len(), "Generation complete");
        Ok(draft)
    }

    async fn recover(
        &self,
        request: &GenerationRequest,
        writer: &dyn StreamWriter,
        error: BackendError,
        content_parts: usize,
    ) -> Result<String, TransportError> {
        let mode = request.mode();
        self.diagnostics.emit(Diagnostic::GenerationFailed {
            mode,
            error: error.to_string(),
            content_parts,
        });

        match request {
            GenerationRequest::Create { title } => self.emit_placeholder(title, writer).await,
            GenerationRequest::Update {
                existing_content, ..
            } => {
                writer
                    .write(StreamPart::Content(existing_content.clone()))
                    .await?;
                Ok(existing_content.clone())
            }
        }
    }

    async fn emit_placeholder(
        &self,
        title: &str,
        writer: &dyn StreamWriter,
    ) -> Result<String, TransportError> {
        self.diagnostics.emit(Diagnostic::PlaceholderEmitted {
            title: title.to_string(),
        });
        let content = placeholder_score(title);
        writer.write(StreamPart::Content(content.clone())).await?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests;
