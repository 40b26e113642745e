use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::{MessageId, MessageRole, SessionId};

/// One turn of a chat session. Creation order within a session is the
/// authoritative order for context-window construction.
///
/// `metadata` is a schema-less map; well-known keys are `model_used`,
/// `context_length` and `conversation_length`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub session_id: SessionId,
    pub role: MessageRole,
    pub content: String,
    pub tokens_used: u32,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(session_id: SessionId, role: MessageRole, content: String) -> Self {
        Self {
            id: MessageId::new(),
            session_id,
            role,
            content,
            tokens_used: 0,
            metadata: Map::new(),
            created_at: Utc::now(),
        }
    }
}
