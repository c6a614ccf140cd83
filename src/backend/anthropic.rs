//! Anthropic Messages API backend.
//!
//! Structured output is obtained by forcing a single tool call whose input
//! schema is the score schema. With `stream: true` the tool input arrives as
//! `input_json_delta` fragments of JSON text, which map directly onto
//! [`PartialObjectDelta::TextDelta`].

use std::time::Duration;

use async_trait::async_trait;
use backon::Retryable;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AnthropicConfig;
use crate::interfaces::backend::{
    BackendError, DeltaStream, GenerationBackend, GenerationCall, PartialObjectDelta, Result,
};
use crate::utils::retry::http_backoff;

/// Name of the forced tool carrying the generated object.
const TOOL_NAME: &str = "score";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    tools: Vec<Tool<'a>>,
    tool_choice: ToolChoice<'a>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    choice_type: &'a str,
    name: &'a str,
}

/// The subset of streaming events this backend acts on.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    ContentBlockDelta { delta: BlockDelta },
    MessageStop,
    Error { error: ApiError },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// Anthropic Messages API client producing partial-object deltas.
pub struct AnthropicBackend {
    client: reqwest::Client,
    config: AnthropicConfig,
    api_key: String,
}

impl AnthropicBackend {
    pub fn new(config: AnthropicConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    /// Build from configuration, reading the API key from the configured
    /// environment variable.
    pub fn from_config(config: &AnthropicConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            BackendError::Config(format!("{} is not set", config.api_key_env))
        })?;
        Self::new(config.clone(), api_key)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| BackendError::Config(e.to_string()))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(&self.config.api_version)
                .map_err(|e| BackendError::Config(e.to_string()))?,
        );
        Ok(headers)
    }

    async fn send(&self, call: &GenerationCall) -> Result<reqwest::Response> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: &call.system,
            messages: vec![Message {
                role: "user",
                content: &call.prompt,
            }],
            tools: vec![Tool {
                name: TOOL_NAME,
                description: "Emit the generated music sheet",
                input_schema: &call.schema,
            }],
            tool_choice: ToolChoice {
                choice_type: "tool",
                name: TOOL_NAME,
            },
            stream: true,
        };

        let response = self
            .client
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl GenerationBackend for AnthropicBackend {
    async fn generate(&self, call: &GenerationCall) -> Result<DeltaStream> {
        let response = (|| async { self.send(call).await })
            .retry(http_backoff())
            .when(BackendError::is_retryable)
            .notify(|e, delay| {
                warn!(error = %e, ?delay, "Generation request failed; retrying");
            })
            .await?;

        debug!(model = %self.config.model, "Generation stream opened");

        let deltas = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) => translate(&event.data).transpose(),
                    Err(e) => Some(Err(BackendError::Stream(e.to_string()))),
                }
            });

        Ok(Box::pin(deltas))
    }
}

/// Map the data of one server-sent event onto a delta. `Ok(None)` for events
/// that carry nothing.
fn translate(data: &str) -> Result<Option<PartialObjectDelta>> {
    let parsed: StreamEvent = serde_json::from_str(data)
        .map_err(|e| BackendError::Protocol(format!("{e}: {data}")))?;

    match parsed {
        StreamEvent::ContentBlockDelta {
            delta: BlockDelta::InputJsonDelta { partial_json },
        } => Ok(Some(PartialObjectDelta::TextDelta(partial_json))),
        StreamEvent::MessageStop => Ok(Some(PartialObjectDelta::Finish)),
        StreamEvent::Error { error } => Err(BackendError::Stream(format!(
            "{}: {}",
            error.error_type, error.message
        ))),
        _ => Ok(None),
    }
}
