use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{ChatRepository, RepositoryError};
use crate::domain::{
    ChatFeedback, ChatMessage, ChatSession, DocumentId, MessageId, SessionId, SubjectId,
};

pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_session(row: &PgRow) -> Result<ChatSession, RepositoryError> {
        Ok(ChatSession {
            id: SessionId::from_uuid(read(row, "id")?),
            subject_id: SubjectId::from_uuid(read(row, "subject_id")?),
            document_id: DocumentId::from_uuid(read(row, "document_id")?),
            title: read(row, "title")?,
            is_active: read(row, "is_active")?,
            created_at: read(row, "created_at")?,
            updated_at: read(row, "updated_at")?,
        })
    }

    fn row_to_message(row: &PgRow) -> Result<ChatMessage, RepositoryError> {
        let role: String = read(row, "role")?;
        let role = role.parse().map_err(RepositoryError::QueryFailed)?;
        let tokens_used: i32 = read(row, "tokens_used")?;
        let metadata: Value = read(row, "metadata")?;
        let metadata = metadata.as_object().cloned().unwrap_or_default();

        Ok(ChatMessage {
            id: MessageId::from_uuid(read(row, "id")?),
            session_id: SessionId::from_uuid(read(row, "session_id")?),
            role,
            content: read(row, "content")?,
            tokens_used: tokens_used as u32,
            metadata,
            created_at: read(row, "created_at")?,
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

const MESSAGE_COLUMNS: &str = "id, session_id, role, content, tokens_used, metadata, created_at";

#[async_trait]
impl ChatRepository for PgChatRepository {
    #[instrument(skip(self, session), fields(session_id = %session.id.as_uuid()))]
    async fn create_session(&self, session: &ChatSession) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO chat_sessions
                (id, subject_id, document_id, title, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.subject_id.as_uuid())
        .bind(session.document_id.as_uuid())
        .bind(&session.title)
        .bind(session.is_active)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %id.as_uuid()))]
    async fn get_session(&self, id: SessionId) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, subject_id, document_id, title, is_active, created_at, updated_at
            FROM chat_sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(Self::row_to_session).transpose()
    }

    #[instrument(skip(self), fields(subject_id = %subject_id.as_uuid(), document_id = %document_id.as_uuid()))]
    async fn find_session(
        &self,
        subject_id: SubjectId,
        document_id: DocumentId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, subject_id, document_id, title, is_active, created_at, updated_at
            FROM chat_sessions
            WHERE subject_id = $1 AND document_id = $2
            "#,
        )
        .bind(subject_id.as_uuid())
        .bind(document_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(Self::row_to_session).transpose()
    }

    #[instrument(skip(self), fields(session_id = %id.as_uuid()))]
    async fn touch_session(&self, id: SessionId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE chat_sessions SET updated_at = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self, message), fields(message_id = %message.id.as_uuid(), session_id = %message.session_id.as_uuid()))]
    async fn append_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages
                (id, session_id, role, content, tokens_used, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.session_id.as_uuid())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.tokens_used as i32)
        .bind(Value::Object(message.metadata.clone()))
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %session_id.as_uuid(), limit))]
    async fn recent_messages(
        &self,
        session_id: SessionId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM chat_messages
            WHERE session_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(session_id.as_uuid())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let mut messages: Vec<ChatMessage> = rows
            .iter()
            .map(Self::row_to_message)
            .collect::<Result<Vec<_>, _>>()?;

        messages.reverse();
        Ok(messages)
    }

    #[instrument(skip(self), fields(session_id = %session_id.as_uuid()))]
    async fn count_messages(&self, session_id: SessionId) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE session_id = $1")
                .bind(session_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(count as u64)
    }

    #[instrument(skip(self), fields(message_id = %id.as_uuid()))]
    async fn get_message(&self, id: MessageId) -> Result<Option<ChatMessage>, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM chat_messages
            WHERE id = $1
            "#
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(Self::row_to_message).transpose()
    }

    #[instrument(skip(self, feedback), fields(message_id = %feedback.message_id.as_uuid(), rating = feedback.rating))]
    async fn create_feedback(&self, feedback: &ChatFeedback) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO chat_feedback (message_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(feedback.message_id.as_uuid())
        .bind(i32::from(feedback.rating))
        .bind(&feedback.comment)
        .bind(feedback.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::ConstraintViolation(db.to_string())
            }
            other => RepositoryError::QueryFailed(other.to_string()),
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(message_id = %message_id.as_uuid()))]
    async fn feedback_exists(&self, message_id: MessageId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM chat_feedback WHERE message_id = $1)")
                .bind(message_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(exists)
    }
}
