use async_trait::async_trait;

use crate::domain::{
    ChatFeedback, ChatMessage, ChatSession, DocumentId, MessageId, SessionId, SubjectId,
};

use super::RepositoryError;

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn create_session(&self, session: &ChatSession) -> Result<(), RepositoryError>;

    async fn get_session(&self, id: SessionId) -> Result<Option<ChatSession>, RepositoryError>;

    async fn find_session(
        &self,
        subject_id: SubjectId,
        document_id: DocumentId,
    ) -> Result<Option<ChatSession>, RepositoryError>;

    async fn touch_session(&self, id: SessionId) -> Result<(), RepositoryError>;

    async fn append_message(&self, message: &ChatMessage) -> Result<(), RepositoryError>;

    /// Up to `limit` most recent messages of the session, returned in
    /// chronological order (oldest first).
    async fn recent_messages(
        &self,
        session_id: SessionId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;

    async fn count_messages(&self, session_id: SessionId) -> Result<u64, RepositoryError>;

    async fn get_message(&self, id: MessageId) -> Result<Option<ChatMessage>, RepositoryError>;

    async fn create_feedback(&self, feedback: &ChatFeedback) -> Result<(), RepositoryError>;

    async fn feedback_exists(&self, message_id: MessageId) -> Result<bool, RepositoryError>;
}
