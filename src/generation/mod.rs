//! Structured generation: decoding a backend's partial JSON into score
//! snapshots, plus the prompts, schema and placeholder the orchestrator uses.

pub mod decoder;
pub mod extractor;
pub mod fallback;
pub mod partial_json;
pub mod prompts;
pub mod schema;

pub use decoder::PartialObjectDecoder;
pub use extractor::{extract, Extraction};
pub use fallback::placeholder_score;
pub use partial_json::parse_partial_json;
