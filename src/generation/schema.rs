//! JSON Schema for generated scores.

use serde_json::{json, Value};

use scorestream_client::GenerationMode;

/// Object field carrying the ABC notation.
pub const CONTENT_FIELD: &str = "abcNotation";
/// Object field carrying the metadata object.
pub const METADATA_FIELD: &str = "metadata";

fn metadata_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string", "description": "Title of the music piece"},
            "composer": {"type": "string", "description": "Composer of the music piece"},
            "timeSignature": {
                "type": "string",
                "description": "Time signature of the music piece (e.g., 4/4)"
            },
            "keySignature": {
                "type": "string",
                "description": "Key signature of the music piece (e.g., C)"
            }
        },
        "required": ["title", "composer", "timeSignature", "keySignature"]
    })
}

/// Schema for a score object. Metadata is required when creating and
/// optional when updating.
pub fn score_schema(mode: GenerationMode) -> Value {
    let (description, required) = match mode {
        GenerationMode::Create => (
            "ABC notation for the music sheet, including both treble and bass clefs if applicable",
            json!([CONTENT_FIELD, METADATA_FIELD]),
        ),
        GenerationMode::Update => (
            "Updated ABC notation for the music sheet",
            json!([CONTENT_FIELD]),
        ),
    };

    json!({
        "type": "object",
        "properties": {
            CONTENT_FIELD: {"type": "string", "description": description},
            METADATA_FIELD: metadata_schema()
        },
        "required": required
    })
}
