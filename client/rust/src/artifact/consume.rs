//! Async drivers feeding a part stream into the reducer.

use futures::{pin_mut, Stream, StreamExt};
use tracing::{debug, warn};

use super::{ArtifactState, Transition};
use crate::diagnostics::Diagnostic;
use crate::part::{decode_line, PartDecodeError, StreamPart};

/// Counts from one pass over a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumeSummary {
    pub applied: usize,
    pub skipped: usize,
    pub commits: usize,
    /// Requests that ended without `finish` and were rolled back.
    pub aborted: usize,
}

impl ConsumeSummary {
    fn record(&mut self, transition: Transition) {
        self.applied += 1;
        if matches!(transition, Transition::Committed { .. }) {
            self.commits += 1;
        }
    }
}

impl ArtifactState {
    /// Apply typed parts until the stream ends.
    ///
    /// A stream that ends mid-request leaves no new version behind.
    pub async fn consume<S>(&mut self, parts: S) -> ConsumeSummary
    where
        S: Stream<Item = StreamPart>,
    {
        pin_mut!(parts);
        let mut summary = ConsumeSummary::default();
        while let Some(part) = parts.next().await {
            let transition = self.apply(part);
            summary.record(transition);
        }
        if self.abort() {
            summary.aborted += 1;
        }
        debug!(?summary, "Part stream ended");
        summary
    }

    /// Decode and apply NDJSON lines until the stream ends.
    ///
    /// Unknown tags and undecodable envelopes are skipped with a diagnostic.
    pub async fn consume_lines<S>(&mut self, lines: S) -> ConsumeSummary
    where
        S: Stream<Item = String>,
    {
        pin_mut!(lines);
        let mut summary = ConsumeSummary::default();
        while let Some(line) = lines.next().await {
            if line.trim().is_empty() {
                continue;
            }
            match decode_line(&line) {
                Ok(decoded) => {
                    let transition = self.apply_decoded(decoded);
                    summary.record(transition);
                }
                Err(PartDecodeError::UnknownType(tag)) => {
                    self.diagnostics().emit(Diagnostic::UnknownPart { tag });
                    summary.skipped += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable stream part");
                    self.diagnostics().emit(Diagnostic::MalformedPart {
                        error: e.to_string(),
                    });
                    summary.skipped += 1;
                }
            }
        }
        if self.abort() {
            summary.aborted += 1;
        }
        summary
    }
}
