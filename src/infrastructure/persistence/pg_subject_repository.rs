use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{RepositoryError, SubjectRepository};
use crate::domain::{QuotaState, Subject, SubjectId};

pub struct PgSubjectRepository {
    pool: PgPool,
}

impl PgSubjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubjectRepository for PgSubjectRepository {
    #[instrument(skip(self, subject), fields(subject_id = %subject.id.as_uuid()))]
    async fn create(&self, subject: &Subject) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO subjects
                (id, email, plan, plan_period_start, documents_used, ai_tokens_used)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(subject.id.as_uuid())
        .bind(&subject.email)
        .bind(subject.plan.as_str())
        .bind(subject.quota.plan_period_start)
        .bind(subject.quota.documents_used as i32)
        .bind(subject.quota.ai_tokens_used as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(subject_id = %id.as_uuid()))]
    async fn get(&self, id: SubjectId) -> Result<Option<Subject>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, plan, plan_period_start, documents_used, ai_tokens_used
            FROM subjects
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        match row {
            Some(row) => {
                let plan: String = row
                    .try_get("plan")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
                let plan = plan.parse().map_err(RepositoryError::QueryFailed)?;
                let documents_used: i32 = row
                    .try_get("documents_used")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
                let ai_tokens_used: i64 = row
                    .try_get("ai_tokens_used")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

                Ok(Some(Subject {
                    id: SubjectId::from_uuid(
                        row.try_get("id")
                            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    ),
                    email: row
                        .try_get("email")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    plan,
                    quota: QuotaState {
                        plan_period_start: row
                            .try_get("plan_period_start")
                            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                        documents_used: documents_used as u32,
                        ai_tokens_used: ai_tokens_used as u64,
                    },
                }))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, quota), fields(subject_id = %id.as_uuid()))]
    async fn save_quota(&self, id: SubjectId, quota: &QuotaState) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE subjects
            SET plan_period_start = $2, documents_used = $3, ai_tokens_used = $4
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(quota.plan_period_start)
        .bind(quota.documents_used as i32)
        .bind(quota.ai_tokens_used as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(subject_id = %id.as_uuid(), amount))]
    async fn add_documents_used(
        &self,
        id: SubjectId,
        amount: u32,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE subjects SET documents_used = documents_used + $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(amount as i32)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(subject_id = %id.as_uuid(), amount))]
    async fn add_tokens_used(&self, id: SubjectId, amount: u64) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE subjects SET ai_tokens_used = ai_tokens_used + $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(amount as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}
