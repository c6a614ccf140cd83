//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Documents table schema.
#[derive(Iden)]
pub enum Documents {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "title"]
    Title,
    #[iden = "kind"]
    Kind,
    #[iden = "current_version_index"]
    CurrentVersionIndex,
}

/// Document versions table schema.
#[derive(Iden)]
pub enum DocumentVersions {
    Table,
    #[iden = "document_id"]
    DocumentId,
    #[iden = "position"]
    Position,
    #[iden = "content"]
    Content,
    #[iden = "created_at"]
    CreatedAt,
}

/// SQL for creating the documents table.
pub const CREATE_DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    kind TEXT NOT NULL,
    current_version_index INTEGER NOT NULL DEFAULT 0
);
"#;

/// SQL for creating the document versions table.
pub const CREATE_DOCUMENT_VERSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS document_versions (
    document_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (document_id, position)
);

CREATE INDEX IF NOT EXISTS idx_document_versions_document ON document_versions(document_id);
"#;
