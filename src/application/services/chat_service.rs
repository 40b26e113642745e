use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use crate::application::ports::{
    ChatRepository, CompletionClient, CompletionError, DocumentRepository, RepositoryError,
    SubjectRepository,
};
use crate::domain::{
    ChatFeedback, ChatMessage, ChatSession, Document, DocumentId, DocumentStatus, MessageId,
    MessageRole, SessionId, Subject, SubjectId,
};

use super::{PromptAssembler, QuotaLedger};

const PROVIDER_FAILURE_NOTICE: &str =
    "Sorry, the AI service hit a temporary error. Please try again in a few moments.";

/// Rough token estimate for an outgoing chat message.
pub fn estimate_message_tokens(text: &str) -> u64 {
    text.split_whitespace().count() as u64 * 2
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub chat_max_tokens: u32,
    /// Bound on one chat completion call.
    pub completion_timeout: Duration,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            chat_max_tokens: 1500,
            completion_timeout: Duration::from_secs(60),
        }
    }
}

/// The two messages a send can produce alongside the stored user message.
/// Provider failures yield `error_message` instead of `assistant_message`;
/// the call itself still succeeds.
#[derive(Debug, Clone)]
pub struct ChatExchange {
    pub user_message: ChatMessage,
    pub assistant_message: Option<ChatMessage>,
    pub error_message: Option<ChatMessage>,
}

/// Orchestrates grounded chat: session lifecycle, quota gating, context
/// assembly and failure conversion.
pub struct ChatService {
    chats: Arc<dyn ChatRepository>,
    documents: Arc<dyn DocumentRepository>,
    subjects: Arc<dyn SubjectRepository>,
    completion: Arc<dyn CompletionClient>,
    prompts: PromptAssembler,
    ledger: QuotaLedger,
    settings: ChatSettings,
}

impl ChatService {
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        documents: Arc<dyn DocumentRepository>,
        subjects: Arc<dyn SubjectRepository>,
        completion: Arc<dyn CompletionClient>,
        prompts: PromptAssembler,
        ledger: QuotaLedger,
        settings: ChatSettings,
    ) -> Self {
        Self {
            chats,
            documents,
            subjects,
            completion,
            prompts,
            ledger,
            settings,
        }
    }

    /// Idempotent per (subject, document): an existing session is returned
    /// as-is, a new one gets a welcome message at no quota cost. The
    /// returned flag is true when the session was created by this call.
    #[tracing::instrument(skip(self), fields(subject_id = %subject_id.as_uuid(), document_id = %document_id.as_uuid()))]
    pub async fn create_session(
        &self,
        subject_id: SubjectId,
        document_id: DocumentId,
    ) -> Result<(ChatSession, bool), ChatError> {
        let document = self.fetch_owned_document(subject_id, document_id).await?;
        if document.status != DocumentStatus::Processed {
            return Err(ChatError::DocumentNotReady);
        }

        if let Some(existing) = self.chats.find_session(subject_id, document_id).await? {
            tracing::debug!(session_id = %existing.id.as_uuid(), "Returning existing chat session");
            return Ok((existing, false));
        }

        let session = ChatSession::new(
            subject_id,
            document_id,
            format!("Chat about {}", document.title),
        );
        self.chats.create_session(&session).await?;

        let welcome = ChatMessage::new(
            session.id,
            MessageRole::Assistant,
            format!(
                "Hello! I'm here to help you understand the document '{}'. You can ask me \
                 about its content, request clarifications or ask for specific analyses. \
                 How can I help?",
                document.title
            ),
        );
        self.chats.append_message(&welcome).await?;

        tracing::info!(session_id = %session.id.as_uuid(), "Chat session created");
        Ok((session, true))
    }

    /// Sends one user message. The user message is persisted before the
    /// completion call so the conversation record survives provider
    /// failures, which are converted into a stored System notice and a
    /// normal response.
    #[tracing::instrument(skip(self, text), fields(subject_id = %subject_id.as_uuid(), session_id = %session_id.as_uuid()))]
    pub async fn send_message(
        &self,
        subject_id: SubjectId,
        session_id: SessionId,
        text: &str,
    ) -> Result<ChatExchange, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::InvalidMessage);
        }

        let session = self
            .chats
            .get_session(session_id)
            .await?
            .filter(|s| s.subject_id == subject_id)
            .ok_or_else(|| ChatError::NotFound("chat session".to_string()))?;
        let mut subject = self.fetch_subject(subject_id).await?;
        let document = self
            .documents
            .get(session.document_id)
            .await?
            .ok_or_else(|| ChatError::NotFound("document".to_string()))?;

        let message_count = self.chats.count_messages(session.id).await?;
        if !self.ledger.can_send_message(subject.plan, message_count) {
            return Err(ChatError::MessageQuotaExceeded);
        }

        if self
            .ledger
            .reset_if_period_elapsed(&mut subject.quota, Utc::now())
        {
            self.subjects.save_quota(subject.id, &subject.quota).await?;
        }
        let estimated = estimate_message_tokens(text);
        if !self
            .ledger
            .can_consume_tokens(subject.plan, &subject.quota, estimated)
        {
            return Err(ChatError::TokenQuotaExceeded);
        }

        let user_message = ChatMessage::new(session.id, MessageRole::User, text.to_string());
        self.chats.append_message(&user_message).await?;

        let history = self.prior_history(session.id, user_message.id).await?;
        let turns = self
            .prompts
            .chat_prompt(&document.summary, &document.extracted_text, &history, text);

        let outcome = tokio::time::timeout(
            self.settings.completion_timeout,
            self.completion.complete(&turns, self.settings.chat_max_tokens),
        )
        .await
        .map_err(|_| CompletionError::Timeout)
        .and_then(|r| r);

        match outcome {
            Ok(completion) => {
                let mut assistant =
                    ChatMessage::new(session.id, MessageRole::Assistant, completion.text);
                assistant.tokens_used = completion.tokens_used;
                assistant
                    .metadata
                    .insert("model_used".to_string(), Value::from(completion.model));
                assistant.metadata.insert(
                    "context_length".to_string(),
                    Value::from(document.extracted_text.len()),
                );
                assistant.metadata.insert(
                    "conversation_length".to_string(),
                    Value::from(history.len()),
                );
                self.chats.append_message(&assistant).await?;

                self.subjects
                    .add_tokens_used(subject.id, u64::from(assistant.tokens_used))
                    .await?;
                self.chats.touch_session(session.id).await?;

                Ok(ChatExchange {
                    user_message,
                    assistant_message: Some(assistant),
                    error_message: None,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat completion failed, storing error notice");
                let content = match &e {
                    CompletionError::Provider(_)
                    | CompletionError::RateLimited
                    | CompletionError::InvalidResponse(_) => PROVIDER_FAILURE_NOTICE.to_string(),
                    CompletionError::Timeout => format!("Internal error: {}", e),
                };
                let error_message = ChatMessage::new(session.id, MessageRole::System, content);
                self.chats.append_message(&error_message).await?;

                Ok(ChatExchange {
                    user_message,
                    assistant_message: None,
                    error_message: Some(error_message),
                })
            }
        }
    }

    /// Records a one-to-one rating on an assistant message.
    #[tracing::instrument(skip(self, comment), fields(subject_id = %subject_id.as_uuid(), message_id = %message_id.as_uuid(), rating))]
    pub async fn record_feedback(
        &self,
        subject_id: SubjectId,
        message_id: MessageId,
        rating: u8,
        comment: &str,
    ) -> Result<ChatFeedback, ChatError> {
        if !(1..=5).contains(&rating) {
            return Err(ChatError::InvalidRating);
        }

        let message = self
            .chats
            .get_message(message_id)
            .await?
            .ok_or_else(|| ChatError::NotFound("message".to_string()))?;
        self.chats
            .get_session(message.session_id)
            .await?
            .filter(|s| s.subject_id == subject_id)
            .ok_or_else(|| ChatError::NotFound("message".to_string()))?;

        if message.role != MessageRole::Assistant {
            return Err(ChatError::NotEligible);
        }
        if self.chats.feedback_exists(message_id).await? {
            return Err(ChatError::AlreadyRated);
        }

        let feedback = ChatFeedback::new(message_id, rating, comment);
        self.chats.create_feedback(&feedback).await?;
        Ok(feedback)
    }

    /// The stored turns preceding the message just appended, bounded by
    /// the assembler's history window.
    async fn prior_history(
        &self,
        session_id: SessionId,
        exclude: MessageId,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let window = self.prompts.history_window();
        let mut recent = self.chats.recent_messages(session_id, window + 1).await?;
        recent.retain(|m| m.id != exclude);
        if recent.len() > window {
            recent.drain(..recent.len() - window);
        }
        Ok(recent)
    }

    async fn fetch_subject(&self, subject_id: SubjectId) -> Result<Subject, ChatError> {
        self.subjects
            .get(subject_id)
            .await?
            .ok_or_else(|| ChatError::NotFound("subject".to_string()))
    }

    async fn fetch_owned_document(
        &self,
        subject_id: SubjectId,
        document_id: DocumentId,
    ) -> Result<Document, ChatError> {
        let document = self
            .documents
            .get(document_id)
            .await?
            .ok_or_else(|| ChatError::NotFound("document".to_string()))?;
        if document.subject_id != subject_id {
            return Err(ChatError::NotFound("document".to_string()));
        }
        Ok(document)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("document must be processed before starting a chat")]
    DocumentNotReady,
    #[error("message must not be empty")]
    InvalidMessage,
    #[error("message limit reached for the current plan")]
    MessageQuotaExceeded,
    #[error("AI token limit reached for the current plan")]
    TokenQuotaExceeded,
    #[error("feedback is only accepted on assistant messages")]
    NotEligible,
    #[error("feedback already recorded for this message")]
    AlreadyRated,
    #[error("rating must be between 1 and 5")]
    InvalidRating,
    #[error("{0} not found")]
    NotFound(String),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
