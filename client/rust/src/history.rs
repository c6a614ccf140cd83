//! Version history and navigation.
//!
//! The history is an append-only list of committed content snapshots plus a
//! cursor. Navigating only moves the cursor; it never touches `versions`.
//! "Viewing latest" is derived from the cursor, never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable, timestamped snapshot of document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVersion {
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl DocumentVersion {
    pub fn new(content: impl Into<String>) -> Self {
        Self::at(content, Utc::now())
    }

    pub fn at(content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            created_at,
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Cursor moved to the given index.
    Moved(usize),
    /// Already at the boundary; nothing changed.
    Disabled,
}

impl Navigation {
    pub fn is_disabled(self) -> bool {
        matches!(self, Navigation::Disabled)
    }
}

/// Raised when persisted history violates the cursor invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidHistory {
    #[error("history has no versions")]
    Empty,
    #[error("current version index {index} out of range for {len} versions")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHistory {
    versions: Vec<DocumentVersion>,
    current_version_index: usize,
}

impl TryFrom<RawHistory> for VersionHistory {
    type Error = InvalidHistory;

    fn try_from(raw: RawHistory) -> Result<Self, Self::Error> {
        VersionHistory::from_versions(raw.versions, raw.current_version_index)
    }
}

/// Ordered committed versions with a navigation cursor.
///
/// Invariant: `0 <= current_version_index < versions.len()` and
/// `versions` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawHistory")]
pub struct VersionHistory {
    versions: Vec<DocumentVersion>,
    current_version_index: usize,
}

impl VersionHistory {
    /// Start a history with a single version.
    pub fn new(initial: DocumentVersion) -> Self {
        Self {
            versions: vec![initial],
            current_version_index: 0,
        }
    }

    /// Rebuild a history from persisted parts, validating the cursor.
    pub fn from_versions(
        versions: Vec<DocumentVersion>,
        current_version_index: usize,
    ) -> Result<Self, InvalidHistory> {
        if versions.is_empty() {
            return Err(InvalidHistory::Empty);
        }
        if current_version_index >= versions.len() {
            return Err(InvalidHistory::IndexOutOfRange {
                index: current_version_index,
                len: versions.len(),
            });
        }
        Ok(Self {
            versions,
            current_version_index,
        })
    }

    pub fn versions(&self) -> &[DocumentVersion] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn current_version_index(&self) -> usize {
        self.current_version_index
    }

    pub fn latest_index(&self) -> usize {
        self.versions.len() - 1
    }

    pub fn current(&self) -> &DocumentVersion {
        &self.versions[self.current_version_index]
    }

    pub fn latest(&self) -> &DocumentVersion {
        &self.versions[self.latest_index()]
    }

    pub fn content_at(&self, index: usize) -> Option<&str> {
        self.versions.get(index).map(|v| v.content.as_str())
    }

    pub fn is_viewing_latest(&self) -> bool {
        self.current_version_index == self.latest_index()
    }

    pub fn can_previous(&self) -> bool {
        self.current_version_index > 0
    }

    pub fn can_next(&self) -> bool {
        !self.is_viewing_latest()
    }

    /// Step back one version. Disabled at the first version.
    pub fn previous(&mut self) -> Navigation {
        if !self.can_previous() {
            return Navigation::Disabled;
        }
        self.current_version_index -= 1;
        Navigation::Moved(self.current_version_index)
    }

    /// Step forward one version. Disabled while viewing the latest.
    pub fn next(&mut self) -> Navigation {
        if !self.can_next() {
            return Navigation::Disabled;
        }
        self.current_version_index += 1;
        Navigation::Moved(self.current_version_index)
    }

    pub fn go_to_latest(&mut self) {
        self.current_version_index = self.latest_index();
    }

    /// Commit content and point the cursor at the latest version.
    ///
    /// An empty latest version (a freshly created document) is filled in
    /// place; otherwise a version is appended only if the content differs
    /// from the latest. Empty content is never committed. Returns true if the
    /// history changed.
    pub fn commit(&mut self, content: String, at: DateTime<Utc>) -> bool {
        let committed = if content.is_empty() || content == self.latest().content {
            false
        } else if self.latest().content.is_empty() {
            let latest = self.latest_index();
            self.versions[latest] = DocumentVersion::at(content, at);
            true
        } else {
            self.versions.push(DocumentVersion::at(content, at));
            true
        };
        self.go_to_latest();
        committed
    }
}

impl Default for VersionHistory {
    fn default() -> Self {
        Self::new(DocumentVersion::new(String::new()))
    }
}
