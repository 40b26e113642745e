use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Document, DocumentId, ProcessingLogEntry};

use super::RepositoryError;

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, document: &Document) -> Result<(), RepositoryError>;

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError>;

    /// Compare-and-set transition into `Processing`. Returns `Ok(false)`
    /// when the document is already Processing, without changing anything.
    async fn try_begin_processing(&self, id: DocumentId) -> Result<bool, RepositoryError>;

    /// Persists a successful run: extracted text, summary, token cost and
    /// the `Processed` status with its timestamp.
    async fn store_results(
        &self,
        id: DocumentId,
        extracted_text: &str,
        summary: &str,
        summary_tokens: u32,
        processed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Moves the document to `Error` without touching text or summary.
    async fn mark_error(&self, id: DocumentId) -> Result<(), RepositoryError>;

    async fn append_log(&self, entry: &ProcessingLogEntry) -> Result<(), RepositoryError>;

    async fn logs(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<ProcessingLogEntry>, RepositoryError>;
}
