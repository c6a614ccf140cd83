//! Score metadata and the safe-merge policy.
//!
//! Metadata is not versioned: it always reflects the latest known values.
//! Incoming fragments are decoded field by field; a field is only adopted when
//! it is present, non-null, and a string. Everything else is dropped and
//! reported back to the caller, never raised.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Wire names of the metadata fields, in display order.
pub const FIELDS: [&str; 4] = ["title", "composer", "timeSignature", "keySignature"];

/// Descriptive metadata for a music score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicMetadata {
    pub title: String,
    pub composer: String,
    pub time_signature: String,
    pub key_signature: String,
}

impl Default for MusicMetadata {
    fn default() -> Self {
        Self {
            title: "New Composition".to_string(),
            composer: "Anonymous".to_string(),
            time_signature: "4/4".to_string(),
            key_signature: "C".to_string(),
        }
    }
}

impl MusicMetadata {
    /// Apply every field the fragment carries. Returns true if anything changed.
    pub fn merge(&mut self, fragment: &MetadataFragment) -> bool {
        let mut changed = false;
        for (slot, incoming) in [
            (&mut self.title, &fragment.title),
            (&mut self.composer, &fragment.composer),
            (&mut self.time_signature, &fragment.time_signature),
            (&mut self.key_signature, &fragment.key_signature),
        ] {
            if let Some(value) = incoming {
                if *slot != *value {
                    *slot = value.clone();
                    changed = true;
                }
            }
        }
        changed
    }
}

/// A partial metadata update, already validated to the expected field types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_signature: Option<String>,
}

/// A field dropped while decoding a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedField {
    pub field: String,
    pub reason: &'static str,
}

/// Outcome of decoding an untyped metadata payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedFragment {
    pub fragment: MetadataFragment,
    pub rejected: Vec<RejectedField>,
}

impl MetadataFragment {
    /// True when the fragment would not change any metadata.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.composer.is_none()
            && self.time_signature.is_none()
            && self.key_signature.is_none()
    }

    /// Decode an untyped payload, keeping only well-typed known fields.
    pub fn decode(value: &Value) -> DecodedFragment {
        let mut decoded = DecodedFragment::default();

        let Some(object) = value.as_object() else {
            if !value.is_null() {
                decoded.rejected.push(RejectedField {
                    field: "$".to_string(),
                    reason: "payload is not an object",
                });
            }
            return decoded;
        };

        for (key, field_value) in object {
            let slot = match key.as_str() {
                "title" => &mut decoded.fragment.title,
                "composer" => &mut decoded.fragment.composer,
                "timeSignature" => &mut decoded.fragment.time_signature,
                "keySignature" => &mut decoded.fragment.key_signature,
                _ => {
                    decoded.rejected.push(RejectedField {
                        field: key.clone(),
                        reason: "unknown field",
                    });
                    continue;
                }
            };

            match field_value {
                Value::String(s) => *slot = Some(s.clone()),
                Value::Null => {}
                _ => decoded.rejected.push(RejectedField {
                    field: key.clone(),
                    reason: "expected a string",
                }),
            }
        }

        decoded
    }
}

impl<'de> Deserialize<'de> for MetadataFragment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(MetadataFragment::decode(&value).fragment)
    }
}
