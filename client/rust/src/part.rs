//! Stream part protocol.
//!
//! Parts flow from exactly one producer (the generation orchestrator) to one
//! consumer (the artifact reducer), strictly in emission order. Parts carry no
//! sequence number; ordering comes from the FIFO transport alone.
//!
//! Wire shape, one JSON envelope per emission:
//! ```text
//! { "type": "content" | "metadata" | "clear" | "finish", "content": <payload> }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::metadata::{MetadataFragment, RejectedField};

/// Wire tags.
pub mod tags {
    pub const CONTENT: &str = "content";
    pub const METADATA: &str = "metadata";
    pub const CLEAR: &str = "clear";
    pub const FINISH: &str = "finish";

    /// Domain-prefixed aliases accepted on decode.
    pub const MUSIC_CONTENT: &str = "music-content";
    pub const MUSIC_METADATA: &str = "music-metadata";
}

/// One typed unit of the generation protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPart {
    /// Full content generated so far (not a delta).
    Content(String),
    /// Metadata fragment to safe-merge.
    Metadata(MetadataFragment),
    /// Reset displayed content for the named document. Never touches history.
    Clear(String),
    /// Terminal signal; always the last part of a request.
    Finish,
}

/// Untyped wire envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default)]
    pub content: Value,
}

/// Errors decoding an envelope into a [`StreamPart`].
#[derive(Debug, thiserror::Error)]
pub enum PartDecodeError {
    /// Tag outside the closed set of part kinds.
    #[error("unknown stream part type: {0}")]
    UnknownType(String),

    /// Payload of the wrong JSON type for a known tag.
    #[error("invalid {part_type} payload: expected {expected}")]
    InvalidPayload {
        part_type: &'static str,
        expected: &'static str,
    },

    /// Not a JSON envelope at all.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl PartDecodeError {
    /// Unknown tags are forward-compatible no-ops for the consumer.
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, PartDecodeError::UnknownType(_))
    }
}

/// A decoded part plus any metadata fields dropped on the way in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPart {
    pub part: StreamPart,
    pub rejected: Vec<RejectedField>,
}

impl StreamPart {
    /// Wire tag for this part.
    pub fn tag(&self) -> &'static str {
        match self {
            StreamPart::Content(_) => tags::CONTENT,
            StreamPart::Metadata(_) => tags::METADATA,
            StreamPart::Clear(_) => tags::CLEAR,
            StreamPart::Finish => tags::FINISH,
        }
    }

    /// True for the terminal part.
    pub fn is_finish(&self) -> bool {
        matches!(self, StreamPart::Finish)
    }

    pub fn to_envelope(&self) -> Envelope {
        let content = match self {
            StreamPart::Content(text) | StreamPart::Clear(text) => Value::String(text.clone()),
            StreamPart::Metadata(fragment) => {
                serde_json::to_value(fragment).unwrap_or(Value::Object(Default::default()))
            }
            StreamPart::Finish => Value::String(String::new()),
        };
        Envelope {
            part_type: self.tag().to_string(),
            content,
        }
    }

    /// Decode an envelope. Tags are matched exactly, never by substring.
    pub fn from_envelope(envelope: Envelope) -> Result<DecodedPart, PartDecodeError> {
        let Envelope {
            part_type,
            content,
        } = envelope;

        let (part, rejected) = match part_type.as_str() {
            tags::CONTENT | tags::MUSIC_CONTENT => {
                (StreamPart::Content(text_payload(tags::CONTENT, content)?), vec![])
            }
            tags::METADATA | tags::MUSIC_METADATA => {
                let decoded = MetadataFragment::decode(&content);
                (StreamPart::Metadata(decoded.fragment), decoded.rejected)
            }
            tags::CLEAR => (StreamPart::Clear(text_payload(tags::CLEAR, content)?), vec![]),
            tags::FINISH => (StreamPart::Finish, vec![]),
            _ => return Err(PartDecodeError::UnknownType(part_type)),
        };

        Ok(DecodedPart { part, rejected })
    }
}

fn text_payload(part_type: &'static str, content: Value) -> Result<String, PartDecodeError> {
    match content {
        Value::String(text) => Ok(text),
        Value::Null => Ok(String::new()),
        _ => Err(PartDecodeError::InvalidPayload {
            part_type,
            expected: "a string",
        }),
    }
}

impl Serialize for StreamPart {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_envelope().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StreamPart {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let envelope = Envelope::deserialize(deserializer)?;
        StreamPart::from_envelope(envelope)
            .map(|decoded| decoded.part)
            .map_err(serde::de::Error::custom)
    }
}

/// Encode a part as a single NDJSON line (without the trailing newline).
pub fn encode_line(part: &StreamPart) -> Result<String, serde_json::Error> {
    serde_json::to_string(&part.to_envelope())
}

/// Decode one NDJSON line.
pub fn decode_line(line: &str) -> Result<DecodedPart, PartDecodeError> {
    let envelope: Envelope = serde_json::from_str(line.trim())?;
    StreamPart::from_envelope(envelope)
}
