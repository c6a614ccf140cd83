//! Partial-object decoder.
//!
//! Consumes a backend's delta stream exactly once and yields a snapshot of
//! the accumulating object whenever a delta changes its structure.

use futures::{stream, Stream, StreamExt};
use serde_json::Value;
use tracing::trace;

use super::partial_json::parse_partial_json;
use crate::interfaces::backend::{BackendError, DeltaStream, PartialObjectDelta};

pub struct PartialObjectDecoder {
    deltas: DeltaStream,
    buffer: String,
    last: Option<Value>,
    exhausted: bool,
}

impl PartialObjectDecoder {
    pub fn new(deltas: DeltaStream) -> Self {
        Self {
            deltas,
            buffer: String::new(),
            last: None,
            exhausted: false,
        }
    }

    /// Next changed snapshot, or the backend error that stopped decoding.
    ///
    /// Returns `None` once the backend finished; an error is returned at
    /// most once and ends the sequence.
    pub async fn next_object(&mut self) -> Option<Result<Value, BackendError>> {
        while !self.exhausted {
            match self.deltas.next().await {
                Some(Ok(PartialObjectDelta::TextDelta(text))) => {
                    self.buffer.push_str(&text);
                    if let Some(object) = self.snapshot() {
                        return Some(Ok(object));
                    }
                }
                Some(Ok(PartialObjectDelta::Finish)) | None => {
                    self.exhausted = true;
                    return self.snapshot().map(Ok);
                }
                Some(Err(e)) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Value, BackendError>> + Send {
        stream::unfold(self, |mut decoder| async move {
            decoder.next_object().await.map(|item| (item, decoder))
        })
    }

    /// Raw JSON text received so far.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    fn snapshot(&mut self) -> Option<Value> {
        let object = parse_partial_json(&self.buffer).filter(Value::is_object)?;
        if self.last.as_ref() == Some(&object) {
            return None;
        }
        trace!(bytes = self.buffer.len(), "Decoded partial object");
        self.last = Some(object.clone());
        Some(object)
    }
}
