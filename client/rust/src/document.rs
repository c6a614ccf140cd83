//! Document model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::{DocumentVersion, VersionHistory};

/// Domain schema selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Music,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Music => "music",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for DocumentKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "music" => Ok(DocumentKind::Music),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// A versioned document.
///
/// Destroyed only by the storage layer; the core has no deletion semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub kind: DocumentKind,
    #[serde(flatten)]
    pub history: VersionHistory,
}

impl Document {
    /// A fresh document: exactly one version with empty content.
    pub fn new(id: Uuid, title: impl Into<String>, kind: DocumentKind) -> Self {
        Self::with_content(id, title, kind, String::new())
    }

    pub fn with_content(
        id: Uuid,
        title: impl Into<String>,
        kind: DocumentKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            kind,
            history: VersionHistory::new(DocumentVersion::new(content)),
        }
    }

    pub fn latest_content(&self) -> &str {
        &self.history.latest().content
    }

    pub fn current_content(&self) -> &str {
        &self.history.current().content
    }
}
