use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::ports::{
    ChatRepository, DocumentRepository, RepositoryError, SubjectRepository,
};
use crate::domain::{
    ChatFeedback, ChatMessage, ChatSession, Document, DocumentId, DocumentStatus, MessageId,
    ProcessingLogEntry, QuotaState, SessionId, Subject, SubjectId,
};

/// In-memory repositories backing tests and credential-less demo runs.
/// Each mirrors the row-scoped atomicity of the Postgres implementations
/// with a single mutex per store.
#[derive(Default)]
pub struct MemoryDocumentRepository {
    documents: Mutex<HashMap<Uuid, Document>>,
    logs: Mutex<Vec<ProcessingLogEntry>>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn create(&self, document: &Document) -> Result<(), RepositoryError> {
        self.documents
            .lock()
            .unwrap()
            .insert(document.id.as_uuid(), document.clone());
        Ok(())
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        Ok(self.documents.lock().unwrap().get(&id.as_uuid()).cloned())
    }

    async fn try_begin_processing(&self, id: DocumentId) -> Result<bool, RepositoryError> {
        let mut documents = self.documents.lock().unwrap();
        let document = documents
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound("document".to_string()))?;

        if document.status == DocumentStatus::Processing {
            return Ok(false);
        }
        document.status = DocumentStatus::Processing;
        document.updated_at = Utc::now();
        Ok(true)
    }

    async fn store_results(
        &self,
        id: DocumentId,
        extracted_text: &str,
        summary: &str,
        summary_tokens: u32,
        processed_at: chrono::DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut documents = self.documents.lock().unwrap();
        let document = documents
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound("document".to_string()))?;

        document.extracted_text = extracted_text.to_string();
        document.summary = summary.to_string();
        document.summary_tokens = summary_tokens;
        document.status = DocumentStatus::Processed;
        document.processed_at = Some(processed_at);
        document.updated_at = processed_at;
        Ok(())
    }

    async fn mark_error(&self, id: DocumentId) -> Result<(), RepositoryError> {
        let mut documents = self.documents.lock().unwrap();
        let document = documents
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound("document".to_string()))?;

        document.status = DocumentStatus::Error;
        document.updated_at = Utc::now();
        Ok(())
    }

    async fn append_log(&self, entry: &ProcessingLogEntry) -> Result<(), RepositoryError> {
        self.logs.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn logs(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<ProcessingLogEntry>, RepositoryError> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.document_id == document_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryChatRepository {
    sessions: Mutex<HashMap<Uuid, ChatSession>>,
    messages: Mutex<Vec<ChatMessage>>,
    feedback: Mutex<HashMap<Uuid, ChatFeedback>>,
}

impl MemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for MemoryChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<(), RepositoryError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.as_uuid(), session.clone());
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self.sessions.lock().unwrap().get(&id.as_uuid()).cloned())
    }

    async fn find_session(
        &self,
        subject_id: SubjectId,
        document_id: DocumentId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.subject_id == subject_id && s.document_id == document_id)
            .cloned())
    }

    async fn touch_session(&self, id: SessionId) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound("chat session".to_string()))?;
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn recent_messages(
        &self,
        session_id: SessionId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().unwrap();
        let session_messages: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();

        let start = session_messages.len().saturating_sub(limit);
        Ok(session_messages[start..].to_vec())
    }

    async fn count_messages(&self, session_id: SessionId) -> Result<u64, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.session_id == session_id)
            .count() as u64)
    }

    async fn get_message(&self, id: MessageId) -> Result<Option<ChatMessage>, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn create_feedback(&self, feedback: &ChatFeedback) -> Result<(), RepositoryError> {
        let mut store = self.feedback.lock().unwrap();
        let key = feedback.message_id.as_uuid();
        if store.contains_key(&key) {
            return Err(RepositoryError::ConstraintViolation(
                "feedback already exists for message".to_string(),
            ));
        }
        store.insert(key, feedback.clone());
        Ok(())
    }

    async fn feedback_exists(&self, message_id: MessageId) -> Result<bool, RepositoryError> {
        Ok(self
            .feedback
            .lock()
            .unwrap()
            .contains_key(&message_id.as_uuid()))
    }
}

#[derive(Default)]
pub struct MemorySubjectRepository {
    subjects: Mutex<HashMap<Uuid, Subject>>,
}

impl MemorySubjectRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubjectRepository for MemorySubjectRepository {
    async fn create(&self, subject: &Subject) -> Result<(), RepositoryError> {
        self.subjects
            .lock()
            .unwrap()
            .insert(subject.id.as_uuid(), subject.clone());
        Ok(())
    }

    async fn get(&self, id: SubjectId) -> Result<Option<Subject>, RepositoryError> {
        Ok(self.subjects.lock().unwrap().get(&id.as_uuid()).cloned())
    }

    async fn save_quota(&self, id: SubjectId, quota: &QuotaState) -> Result<(), RepositoryError> {
        let mut subjects = self.subjects.lock().unwrap();
        let subject = subjects
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound("subject".to_string()))?;
        subject.quota = *quota;
        Ok(())
    }

    async fn add_documents_used(&self, id: SubjectId, amount: u32) -> Result<(), RepositoryError> {
        let mut subjects = self.subjects.lock().unwrap();
        let subject = subjects
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound("subject".to_string()))?;
        subject.quota.documents_used += amount;
        Ok(())
    }

    async fn add_tokens_used(&self, id: SubjectId, amount: u64) -> Result<(), RepositoryError> {
        let mut subjects = self.subjects.lock().unwrap();
        let subject = subjects
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound("subject".to_string()))?;
        subject.quota.ai_tokens_used += amount;
        Ok(())
    }
}
