use async_trait::async_trait;

use crate::domain::{QuotaState, Subject, SubjectId};

use super::RepositoryError;

#[async_trait]
pub trait SubjectRepository: Send + Sync {
    async fn create(&self, subject: &Subject) -> Result<(), RepositoryError>;

    async fn get(&self, id: SubjectId) -> Result<Option<Subject>, RepositoryError>;

    /// Persists a period reset: both counters and the new period start in
    /// one row update.
    async fn save_quota(&self, id: SubjectId, quota: &QuotaState) -> Result<(), RepositoryError>;

    /// Atomic increment of the document counter, scoped to the subject row.
    async fn add_documents_used(&self, id: SubjectId, amount: u32) -> Result<(), RepositoryError>;

    /// Atomic increment of the token counter, scoped to the subject row.
    async fn add_tokens_used(&self, id: SubjectId, amount: u64) -> Result<(), RepositoryError>;
}
