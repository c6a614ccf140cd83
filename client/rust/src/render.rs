//! Renderer contract.
//!
//! Rendering is a pure function of content. A renderer that is still loading
//! is represented by an explicit [`RendererHandle`] owned by the consumer, and
//! render failures live in [`ScoreView`], never in the artifact state.

use std::fmt;
use std::sync::Arc;

use crate::artifact::ArtifactState;
use crate::diagnostics::{Diagnostic, SharedDiagnostics, TracingDiagnostics};

/// Summary of a rendered score.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedView {
    pub title: Option<String>,
    pub composer: Option<String>,
    pub meter: Option<String>,
    pub key: String,
    pub voices: Vec<String>,
    pub body_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("nothing to render")]
    Empty,

    #[error("missing {0}: header field")]
    MissingHeader(&'static str),

    #[error("renderer is not ready")]
    NotReady,

    #[error("render failed: {0}")]
    Failed(String),
}

/// Turns content into a view. Must not block.
pub trait Renderer: Send + Sync {
    fn render(&self, content: &str) -> Result<RenderedView, RenderError>;
}

/// Readiness capability for a renderer that may still be loading.
#[derive(Clone, Default)]
pub struct RendererHandle {
    renderer: Option<Arc<dyn Renderer>>,
}

impl fmt::Debug for RendererHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererHandle")
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl RendererHandle {
    /// A handle whose renderer has not loaded yet.
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn ready(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            renderer: Some(renderer),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.renderer.is_some()
    }

    /// Mark the renderer loaded.
    pub fn set_ready(&mut self, renderer: Arc<dyn Renderer>) {
        self.renderer = Some(renderer);
    }

    pub fn render(&self, content: &str) -> Result<RenderedView, RenderError> {
        match &self.renderer {
            Some(renderer) => renderer.render(content),
            None => Err(RenderError::NotReady),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ViewState {
    Blank,
    Rendered(RenderedView),
    Failed(RenderError),
}

/// Displayed view of an artifact. Re-renders only when content changes, or
/// when a previous attempt found the renderer not ready.
pub struct ScoreView {
    handle: RendererHandle,
    rendered_for: Option<String>,
    state: ViewState,
    diagnostics: SharedDiagnostics,
}

impl fmt::Debug for ScoreView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoreView")
            .field("handle", &self.handle)
            .field("state", &self.state)
            .finish()
    }
}

impl ScoreView {
    pub fn new(handle: RendererHandle) -> Self {
        Self {
            handle,
            rendered_for: None,
            state: ViewState::Blank,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: SharedDiagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn handle_mut(&mut self) -> &mut RendererHandle {
        &mut self.handle
    }

    /// Render `content` if it differs from what is on screen.
    /// Returns true if a render was attempted.
    pub fn update(&mut self, content: &str) -> bool {
        let stale = matches!(self.state, ViewState::Failed(RenderError::NotReady));
        if !stale && self.rendered_for.as_deref() == Some(content) {
            return false;
        }
        self.rendered_for = Some(content.to_string());

        if content.is_empty() {
            self.state = ViewState::Blank;
            return false;
        }

        self.state = match self.handle.render(content) {
            Ok(view) => ViewState::Rendered(view),
            Err(RenderError::NotReady) => ViewState::Failed(RenderError::NotReady),
            Err(e) => {
                self.diagnostics.emit(Diagnostic::RenderFailed {
                    error: e.to_string(),
                });
                ViewState::Failed(e)
            }
        };
        true
    }

    /// Follow the artifact's displayed content.
    pub fn sync(&mut self, artifact: &ArtifactState) -> bool {
        self.update(artifact.displayed_content())
    }

    pub fn view(&self) -> Option<&RenderedView> {
        match &self.state {
            ViewState::Rendered(view) => Some(view),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RenderError> {
        match &self.state {
            ViewState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.state == ViewState::Blank
    }
}

/// Summarises an ABC tune from its header fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbcHeaderRenderer;

impl Renderer for AbcHeaderRenderer {
    fn render(&self, content: &str) -> Result<RenderedView, RenderError> {
        if content.trim().is_empty() {
            return Err(RenderError::Empty);
        }

        let mut view = RenderedView::default();
        let mut has_index = false;
        let mut key = None;

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('%') {
                continue;
            }
            match header_field(line) {
                Some(('X', _)) => has_index = true,
                Some(('T', value)) => {
                    view.title.get_or_insert_with(|| value.to_string());
                }
                Some(('C', value)) => {
                    view.composer.get_or_insert_with(|| value.to_string());
                }
                Some(('M', value)) => view.meter = Some(value.to_string()),
                Some(('K', value)) => key = Some(value.to_string()),
                Some(('V', value)) => {
                    let id = value.split_whitespace().next().unwrap_or(value);
                    if !view.voices.iter().any(|v| v == id) {
                        view.voices.push(id.to_string());
                    }
                }
                Some(_) => {}
                None if key.is_some() => view.body_lines += 1,
                None => {}
            }
        }

        if !has_index {
            return Err(RenderError::MissingHeader("X"));
        }
        view.key = key.ok_or(RenderError::MissingHeader("K"))?;
        Ok(view)
    }
}

/// `T:Title` -> `('T', "Title")`. Only single ASCII letters count as fields.
fn header_field(line: &str) -> Option<(char, &str)> {
    let mut chars = line.chars();
    let field = chars.next()?;
    if !field.is_ascii_alphabetic() || chars.next()? != ':' {
        return None;
    }
    Some((field, line[2..].trim()))
}
