//! Scripted generation backend.
//!
//! Replays recorded calls: each `generate` consumes the next entry of the
//! script. Used for offline runs and tests.
//!
//! ```yaml
//! calls:
//!   - deltas: ['{"abcNotation":"X:1\nT:Sc', 'ale\nK:C\nCDEF|"}']
//!   - fail_before: "overloaded"
//!   - deltas: ['{"abcNotation":"X:1']
//!     fail_after: "connection reset"
//! ```

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::interfaces::backend::{
    BackendError, DeltaStream, GenerationBackend, GenerationCall, PartialObjectDelta, Result,
};

/// One scripted backend call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScriptedCall {
    /// Fail before any delta is produced.
    pub fail_before: Option<String>,
    /// JSON text fragments, in order.
    pub deltas: Vec<String>,
    /// Fail after the deltas instead of finishing.
    pub fail_after: Option<String>,
}

impl ScriptedCall {
    pub fn deltas<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            deltas: deltas.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Split complete JSON text into fragments of `size` characters.
    pub fn chunked(json: &str, size: usize) -> Self {
        let chars: Vec<char> = json.chars().collect();
        Self::deltas(chars.chunks(size.max(1)).map(|c| c.iter().collect::<String>()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_before: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.fail_after = Some(message.into());
        self
    }

    fn into_stream(self) -> DeltaStream {
        let mut items: Vec<Result<PartialObjectDelta>> = self
            .deltas
            .into_iter()
            .map(|text| Ok(PartialObjectDelta::TextDelta(text)))
            .collect();
        items.push(match self.fail_after {
            Some(message) => Err(BackendError::Scripted(message)),
            None => Ok(PartialObjectDelta::Finish),
        });
        Box::pin(stream::iter(items))
    }
}

#[derive(Debug, Default, Deserialize)]
struct Script {
    #[serde(default)]
    calls: Vec<ScriptedCall>,
}

/// Backend that replays a script of calls.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<ScriptedCall>>,
    received: Mutex<Vec<GenerationCall>>,
}

impl ScriptedBackend {
    pub fn new(calls: Vec<ScriptedCall>) -> Self {
        Self {
            script: Mutex::new(calls.into()),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let script: Script =
            serde_yaml::from_str(yaml).map_err(|e| BackendError::Config(e.to_string()))?;
        Ok(Self::new(script.calls))
    }

    pub async fn from_file(path: &str) -> Result<Self> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BackendError::Config(format!("{path}: {e}")))?;
        Self::from_yaml(&yaml)
    }

    /// Calls received so far, in order.
    pub async fn received(&self) -> Vec<GenerationCall> {
        self.received.lock().await.clone()
    }

    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(&self, call: &GenerationCall) -> Result<DeltaStream> {
        self.received.lock().await.push(call.clone());

        let next = self.script.lock().await.pop_front();
        let Some(scripted) = next else {
            return Err(BackendError::Scripted("script exhausted".to_string()));
        };
        debug!(deltas = scripted.deltas.len(), "Replaying scripted call");

        if let Some(message) = scripted.fail_before {
            return Err(BackendError::Scripted(message));
        }
        Ok(scripted.into_stream())
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use serde_json::json;

    use super::*;

    fn call() -> GenerationCall {
        GenerationCall {
            schema: json!({}),
            system: "system".to_string(),
            prompt: "prompt".to_string(),
        }
    }

    #[tokio::test]
    async fn test_replays_calls_in_order() {
        let backend = ScriptedBackend::new(vec![
            ScriptedCall::deltas(["{", "}"]),
            ScriptedCall::failing("overloaded"),
        ]);

        let deltas: Vec<_> = backend.generate(&call()).await.unwrap().collect().await;
        assert_eq!(deltas.len(), 3);
        assert!(matches!(
            deltas.last(),
            Some(Ok(PartialObjectDelta::Finish))
        ));

        assert!(backend.generate(&call()).await.is_err());
        assert!(matches!(
            backend.generate(&call()).await,
            Err(BackendError::Scripted(m)) if m == "script exhausted"
        ));
        assert_eq!(backend.received().await.len(), 3);
    }

    #[tokio::test]
    async fn test_fail_after_ends_with_error() {
        let backend = ScriptedBackend::new(vec![ScriptedCall::deltas(["{"]).then_fail("reset")]);

        let deltas: Vec<_> = backend.generate(&call()).await.unwrap().collect().await;
        assert!(matches!(deltas.last(), Some(Err(BackendError::Scripted(_)))));
    }

    #[test]
    fn test_chunked_splits_on_characters() {
        let scripted = ScriptedCall::chunked(r#"{"a":"é"}"#, 3);
        assert_eq!(scripted.deltas.concat(), r#"{"a":"é"}"#);
        assert_eq!(scripted.deltas[0], r#"{"a"#);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
calls:
  - deltas: ['{"abcNotation":"X:1', '"}']
  - fail_before: overloaded
  - deltas: ['{']
    fail_after: connection reset
"#;
        let backend = ScriptedBackend::from_yaml(yaml).unwrap();
        let script = backend.script.try_lock().unwrap();
        assert_eq!(script.len(), 3);
        assert_eq!(script[1].fail_before.as_deref(), Some("overloaded"));
        assert_eq!(script[2].fail_after.as_deref(), Some("connection reset"));
    }
}
