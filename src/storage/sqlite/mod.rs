//! SQLite implementation of the document store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};
use sqlx::{Acquire, Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use scorestream_client::{Document, DocumentKind, DocumentVersion, VersionHistory};

use super::schema::{
    DocumentVersions, Documents, CREATE_DOCUMENTS_TABLE, CREATE_DOCUMENT_VERSIONS_TABLE,
};
use super::{Result, StorageError};
use crate::interfaces::DocumentStore;

/// SQLite implementation of DocumentStore.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Create a new SQLite document store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_DOCUMENTS_TABLE)
            .execute(&self.pool)
            .await?;
        sqlx::query(CREATE_DOCUMENT_VERSIONS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn load(&self, id: Uuid) -> Result<Document> {
        let id_str = id.to_string();

        let query = Query::select()
            .columns([
                Documents::Title,
                Documents::Kind,
                Documents::CurrentVersionIndex,
            ])
            .from(Documents::Table)
            .and_where(Expr::col(Documents::Id).eq(&id_str))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound(id))?;

        let title: String = row.try_get("title")?;
        let kind: String = row.try_get("kind")?;
        let current_version_index: i64 = row.try_get("current_version_index")?;
        let kind: DocumentKind = kind
            .parse()
            .map_err(|_| StorageError::InvalidKind(kind.clone()))?;

        let query = Query::select()
            .columns([DocumentVersions::Content, DocumentVersions::CreatedAt])
            .from(DocumentVersions::Table)
            .and_where(Expr::col(DocumentVersions::DocumentId).eq(&id_str))
            .order_by(DocumentVersions::Position, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut versions = Vec::with_capacity(rows.len());
        for row in rows {
            let content: String = row.try_get("content")?;
            let created_at: String = row.try_get("created_at")?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|_| StorageError::InvalidTimestamp(created_at.clone()))?
                .with_timezone(&Utc);
            versions.push(DocumentVersion::at(content, created_at));
        }

        let index = usize::try_from(current_version_index).unwrap_or(usize::MAX);
        let history = VersionHistory::from_versions(versions, index)
            .map_err(|source| StorageError::InvalidHistory { id, source })?;

        Ok(Document {
            id,
            title,
            kind,
            history,
        })
    }

    async fn save(&self, document: &Document) -> Result<()> {
        let id_str = document.id.to_string();

        // Use a transaction so a reader never sees a partial history
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let query = Query::insert()
            .into_table(Documents::Table)
            .columns([
                Documents::Id,
                Documents::Title,
                Documents::Kind,
                Documents::CurrentVersionIndex,
            ])
            .values_panic([
                id_str.clone().into(),
                document.title.clone().into(),
                document.kind.as_str().into(),
                (document.history.current_version_index() as i64).into(),
            ])
            .on_conflict(
                OnConflict::column(Documents::Id)
                    .update_columns([
                        Documents::Title,
                        Documents::Kind,
                        Documents::CurrentVersionIndex,
                    ])
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);
        sqlx::query(&query).execute(&mut *tx).await?;

        let query = Query::delete()
            .from_table(DocumentVersions::Table)
            .and_where(Expr::col(DocumentVersions::DocumentId).eq(&id_str))
            .to_string(SqliteQueryBuilder);
        sqlx::query(&query).execute(&mut *tx).await?;

        for (position, version) in document.history.versions().iter().enumerate() {
            let query = Query::insert()
                .into_table(DocumentVersions::Table)
                .columns([
                    DocumentVersions::DocumentId,
                    DocumentVersions::Position,
                    DocumentVersions::Content,
                    DocumentVersions::CreatedAt,
                ])
                .values_panic([
                    id_str.clone().into(),
                    (position as i64).into(),
                    version.content.clone().into(),
                    version.created_at.to_rfc3339().into(),
                ])
                .to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        debug!(document_id = %document.id, versions = document.history.len(), "Saved document");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Uuid>> {
        let query = Query::select()
            .column(Documents::Id)
            .from(Documents::Table)
            .order_by(Documents::Id, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> Result<Uuid> {
                let id: String = row.try_get("id")?;
                Ok(Uuid::parse_str(&id)?)
            })
            .collect()
    }
}
