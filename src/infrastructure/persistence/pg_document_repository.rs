use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{DocumentRepository, RepositoryError};
use crate::domain::{
    ContentType, Document, DocumentId, ProcessingLogEntry, ProcessingStep, StepOutcome, SubjectId,
};

pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_document(row: &PgRow) -> Result<Document, RepositoryError> {
        let content_type: String = read(row, "content_type")?;
        let content_type = ContentType::from_mime(&content_type)
            .ok_or_else(|| RepositoryError::QueryFailed(format!("bad content type: {content_type}")))?;
        let status: String = read(row, "status")?;
        let status = status.parse().map_err(RepositoryError::QueryFailed)?;
        let size_bytes: i64 = read(row, "size_bytes")?;
        let summary_tokens: i32 = read(row, "summary_tokens")?;

        Ok(Document {
            id: DocumentId::from_uuid(read(row, "id")?),
            subject_id: SubjectId::from_uuid(read(row, "subject_id")?),
            title: read(row, "title")?,
            storage_path: read(row, "storage_path")?,
            content_type,
            size_bytes: size_bytes as u64,
            status,
            extracted_text: read(row, "extracted_text")?,
            summary: read(row, "summary")?,
            summary_tokens: summary_tokens as u32,
            created_at: read(row, "created_at")?,
            updated_at: read(row, "updated_at")?,
            processed_at: read(row, "processed_at")?,
        })
    }
}

fn read<'r, T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>>(
    row: &'r PgRow,
    column: &str,
) -> Result<T, RepositoryError> {
    row.try_get(column)
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    #[instrument(skip(self, document), fields(document_id = %document.id.as_uuid()))]
    async fn create(&self, document: &Document) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO documents
                (id, subject_id, title, storage_path, content_type, size_bytes, status,
                 extracted_text, summary, summary_tokens, created_at, updated_at, processed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(document.id.as_uuid())
        .bind(document.subject_id.as_uuid())
        .bind(&document.title)
        .bind(&document.storage_path)
        .bind(document.content_type.as_mime())
        .bind(document.size_bytes as i64)
        .bind(document.status.as_str())
        .bind(&document.extracted_text)
        .bind(&document.summary)
        .bind(document.summary_tokens as i32)
        .bind(document.created_at)
        .bind(document.updated_at)
        .bind(document.processed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(document_id = %id.as_uuid()))]
    async fn get(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, subject_id, title, storage_path, content_type, size_bytes, status,
                   extracted_text, summary, summary_tokens, created_at, updated_at, processed_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(Self::row_to_document).transpose()
    }

    #[instrument(skip(self), fields(document_id = %id.as_uuid()))]
    async fn try_begin_processing(&self, id: DocumentId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET status = 'PROCESSING', updated_at = $2
            WHERE id = $1 AND status <> 'PROCESSING'
            "#,
        )
        .bind(id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, extracted_text, summary), fields(document_id = %id.as_uuid(), summary_tokens))]
    async fn store_results(
        &self,
        id: DocumentId,
        extracted_text: &str,
        summary: &str,
        summary_tokens: u32,
        processed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE documents
            SET extracted_text = $2, summary = $3, summary_tokens = $4,
                status = 'PROCESSED', processed_at = $5, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(extracted_text)
        .bind(summary)
        .bind(summary_tokens as i32)
        .bind(processed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(document_id = %id.as_uuid()))]
    async fn mark_error(&self, id: DocumentId) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE documents
            SET status = 'ERROR', updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self, entry), fields(document_id = %entry.document_id.as_uuid(), step = %entry.step))]
    async fn append_log(&self, entry: &ProcessingLogEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO document_processing_logs (document_id, step, outcome, message, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.document_id.as_uuid())
        .bind(entry.step.as_str())
        .bind(entry.outcome.as_str())
        .bind(&entry.message)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(document_id = %document_id.as_uuid()))]
    async fn logs(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<ProcessingLogEntry>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT document_id, step, outcome, message, created_at
            FROM document_processing_logs
            WHERE document_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(document_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let step: String = read(row, "step")?;
                let step: ProcessingStep = step.parse().map_err(RepositoryError::QueryFailed)?;
                let outcome: String = read(row, "outcome")?;
                let outcome: StepOutcome =
                    outcome.parse().map_err(RepositoryError::QueryFailed)?;
                let document_id: Uuid = read(row, "document_id")?;

                Ok(ProcessingLogEntry {
                    document_id: DocumentId::from_uuid(document_id),
                    step,
                    outcome,
                    message: read(row, "message")?,
                    created_at: read(row, "created_at")?,
                })
            })
            .collect()
    }
}
