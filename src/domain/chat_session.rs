use chrono::{DateTime, Utc};

use super::{DocumentId, SessionId, SubjectId};

/// A chat session bound to one processed document. At most one session
/// exists per (subject, document) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    pub id: SessionId,
    pub subject_id: SubjectId,
    pub document_id: DocumentId,
    pub title: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(subject_id: SubjectId, document_id: DocumentId, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            subject_id,
            document_id,
            title,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
