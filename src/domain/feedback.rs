use chrono::{DateTime, Utc};

use super::MessageId;

/// A rating on one assistant message. One-to-one with the message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatFeedback {
    pub message_id: MessageId,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl ChatFeedback {
    pub fn new(message_id: MessageId, rating: u8, comment: impl Into<String>) -> Self {
        Self {
            message_id,
            rating,
            comment: comment.into(),
            created_at: Utc::now(),
        }
    }
}
