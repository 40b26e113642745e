use std::sync::Arc;
use std::sync::Mutex;

use lexchat::application::ports::{
    ChatRepository, Completion, CompletionClient, CompletionError, DocumentRepository,
    SubjectRepository, Turn,
};
use lexchat::application::services::{
    ChatError, ChatService, ChatSettings, PromptAssembler, PromptSettings, QuotaLedger,
};
use lexchat::domain::{
    ChatMessage, ContentType, Document, DocumentId, DocumentStatus, Limit, MessageRole, Plan,
    PlanLimitTable, PlanLimits, SessionId, Subject, SubjectId,
};
use lexchat::infrastructure::llm::FallbackCompletionClient;
use lexchat::infrastructure::persistence::{
    MemoryChatRepository, MemoryDocumentRepository, MemorySubjectRepository,
};

struct FailingCompletionClient;

#[async_trait::async_trait]
impl CompletionClient for FailingCompletionClient {
    async fn complete(
        &self,
        _turns: &[Turn],
        _max_tokens: u32,
    ) -> Result<Completion, CompletionError> {
        Err(CompletionError::Provider("backend unavailable".to_string()))
    }
}

/// Records the turns of the last completion call.
#[derive(Default)]
struct CapturingCompletionClient {
    turns: Mutex<Vec<Turn>>,
}

#[async_trait::async_trait]
impl CompletionClient for CapturingCompletionClient {
    async fn complete(
        &self,
        turns: &[Turn],
        _max_tokens: u32,
    ) -> Result<Completion, CompletionError> {
        *self.turns.lock().unwrap() = turns.to_vec();
        Ok(Completion {
            text: "captured answer".to_string(),
            tokens_used: 42,
            model: "capture-model".to_string(),
        })
    }
}

struct Harness {
    service: ChatService,
    chats: Arc<MemoryChatRepository>,
    documents: Arc<MemoryDocumentRepository>,
    subjects: Arc<MemorySubjectRepository>,
}

fn free_limits(tokens: Limit, messages: Limit) -> PlanLimitTable {
    PlanLimitTable {
        free: PlanLimits {
            documents_per_month: Limit::Capped(10),
            ai_tokens_per_month: tokens,
            chat_messages_per_document: messages,
        },
        premium: PlanLimitTable::default().premium,
    }
}

fn harness(limits: PlanLimitTable, completion: Arc<dyn CompletionClient>) -> Harness {
    let chats = Arc::new(MemoryChatRepository::new());
    let documents = Arc::new(MemoryDocumentRepository::new());
    let subjects = Arc::new(MemorySubjectRepository::new());

    let service = ChatService::new(
        chats.clone(),
        documents.clone(),
        subjects.clone(),
        completion,
        PromptAssembler::new(PromptSettings::default()),
        QuotaLedger::new(limits),
        ChatSettings::default(),
    );

    Harness {
        service,
        chats,
        documents,
        subjects,
    }
}

async fn seed_subject(subjects: &MemorySubjectRepository) -> SubjectId {
    let subject = Subject::new("user@example.com".to_string(), Plan::Free);
    subjects.create(&subject).await.unwrap();
    subject.id
}

async fn seed_processed_document(
    documents: &MemoryDocumentRepository,
    subject_id: SubjectId,
) -> DocumentId {
    let mut document = Document::new(
        subject_id,
        "Lease agreement".to_string(),
        ContentType::Text,
        "documents/lease".to_string(),
        128,
    );
    document.status = DocumentStatus::Processed;
    document.extracted_text = "The tenant shall pay rent monthly.".to_string();
    document.summary = "A lease: rent is due monthly.".to_string();
    documents.create(&document).await.unwrap();
    document.id
}

#[tokio::test]
async fn given_unprocessed_document_when_creating_session_then_not_ready() {
    let h = harness(
        free_limits(Limit::Capped(10_000), Limit::Capped(50)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects).await;

    let document = Document::new(
        subject_id,
        "Raw upload".to_string(),
        ContentType::Text,
        "documents/raw".to_string(),
        10,
    );
    h.documents.create(&document).await.unwrap();

    let result = h.service.create_session(subject_id, document.id).await;

    assert!(matches!(result, Err(ChatError::DocumentNotReady)));
}

#[tokio::test]
async fn given_repeated_create_session_when_called_twice_then_returns_same_session_once_welcomed() {
    let h = harness(
        free_limits(Limit::Capped(10_000), Limit::Capped(50)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects).await;
    let document_id = seed_processed_document(&h.documents, subject_id).await;

    let (first, created_first) = h
        .service
        .create_session(subject_id, document_id)
        .await
        .unwrap();
    let (second, created_second) = h
        .service
        .create_session(subject_id, document_id)
        .await
        .unwrap();

    assert!(created_first);
    assert!(!created_second);
    assert_eq!(first.id, second.id);
    assert_eq!(first.title, "Chat about Lease agreement");

    let messages = h.chats.recent_messages(first.id, 10).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::Assistant);
    assert!(messages[0].content.contains("Lease agreement"));
}

#[tokio::test]
async fn given_blank_message_when_sending_then_rejected_without_persistence() {
    let h = harness(
        free_limits(Limit::Capped(10_000), Limit::Capped(50)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects).await;
    let document_id = seed_processed_document(&h.documents, subject_id).await;
    let (session, _) = h
        .service
        .create_session(subject_id, document_id)
        .await
        .unwrap();

    let result = h.service.send_message(subject_id, session.id, "   \n\t").await;

    assert!(matches!(result, Err(ChatError::InvalidMessage)));
    assert_eq!(h.chats.count_messages(session.id).await.unwrap(), 1);
}

#[tokio::test]
async fn given_processed_document_when_sending_message_then_exchange_completes() {
    let h = harness(
        free_limits(Limit::Capped(10_000), Limit::Capped(50)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects).await;
    let document_id = seed_processed_document(&h.documents, subject_id).await;
    let (session, _) = h
        .service
        .create_session(subject_id, document_id)
        .await
        .unwrap();

    let exchange = h
        .service
        .send_message(subject_id, session.id, "When is rent due?")
        .await
        .unwrap();

    assert_eq!(exchange.user_message.role, MessageRole::User);
    assert_eq!(exchange.user_message.content, "When is rent due?");
    assert!(exchange.error_message.is_none());

    let assistant = exchange.assistant_message.unwrap();
    assert_eq!(assistant.role, MessageRole::Assistant);
    assert_eq!(assistant.tokens_used, 150);
    assert!(assistant.metadata.contains_key("model_used"));
    assert!(assistant.metadata.contains_key("context_length"));
    assert!(assistant.metadata.contains_key("conversation_length"));

    // welcome + user + assistant
    assert_eq!(h.chats.count_messages(session.id).await.unwrap(), 3);

    let subject = h.subjects.get(subject_id).await.unwrap().unwrap();
    assert_eq!(subject.quota.ai_tokens_used, 150);
}

#[tokio::test]
async fn given_provider_failure_when_sending_message_then_system_notice_is_stored() {
    let h = harness(
        free_limits(Limit::Capped(10_000), Limit::Capped(50)),
        Arc::new(FailingCompletionClient),
    );
    let subject_id = seed_subject(&h.subjects).await;
    let document_id = seed_processed_document(&h.documents, subject_id).await;
    let (session, _) = h
        .service
        .create_session(subject_id, document_id)
        .await
        .unwrap();

    let exchange = h
        .service
        .send_message(subject_id, session.id, "Anyone there?")
        .await
        .unwrap();

    assert!(exchange.assistant_message.is_none());
    let notice = exchange.error_message.unwrap();
    assert_eq!(notice.role, MessageRole::System);
    assert!(notice.content.contains("temporary error"));
    // The provider's internal failure text never reaches the conversation.
    assert!(!notice.content.contains("backend unavailable"));

    // welcome + user + system notice, and no tokens were charged.
    assert_eq!(h.chats.count_messages(session.id).await.unwrap(), 3);
    let subject = h.subjects.get(subject_id).await.unwrap().unwrap();
    assert_eq!(subject.quota.ai_tokens_used, 0);
}

#[tokio::test]
async fn given_message_limit_reached_when_sending_then_rejected() {
    // The welcome message already counts toward a one-message budget.
    let h = harness(
        free_limits(Limit::Capped(10_000), Limit::Capped(1)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects).await;
    let document_id = seed_processed_document(&h.documents, subject_id).await;
    let (session, _) = h
        .service
        .create_session(subject_id, document_id)
        .await
        .unwrap();

    let result = h
        .service
        .send_message(subject_id, session.id, "One more?")
        .await;

    assert!(matches!(result, Err(ChatError::MessageQuotaExceeded)));
    assert_eq!(h.chats.count_messages(session.id).await.unwrap(), 1);
}

#[tokio::test]
async fn given_token_budget_exhausted_when_sending_then_rejected_before_persisting_user_message() {
    let h = harness(
        free_limits(Limit::Capped(5), Limit::Capped(50)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects).await;
    let document_id = seed_processed_document(&h.documents, subject_id).await;
    let (session, _) = h
        .service
        .create_session(subject_id, document_id)
        .await
        .unwrap();

    // Ten words estimate to twenty tokens, well over the five-token budget.
    let result = h
        .service
        .send_message(
            subject_id,
            session.id,
            "one two three four five six seven eight nine ten",
        )
        .await;

    assert!(matches!(result, Err(ChatError::TokenQuotaExceeded)));
    assert_eq!(h.chats.count_messages(session.id).await.unwrap(), 1);
}

#[tokio::test]
async fn given_long_conversation_when_sending_then_context_replays_last_ten_turns() {
    let completion = Arc::new(CapturingCompletionClient::default());
    let h = harness(
        free_limits(Limit::Capped(100_000), Limit::Unlimited),
        completion.clone(),
    );
    let subject_id = seed_subject(&h.subjects).await;
    let document_id = seed_processed_document(&h.documents, subject_id).await;
    let (session, _) = h
        .service
        .create_session(subject_id, document_id)
        .await
        .unwrap();

    for i in 1..=15 {
        let user = ChatMessage::new(session.id, MessageRole::User, format!("question {i}"));
        h.chats.append_message(&user).await.unwrap();
        let assistant =
            ChatMessage::new(session.id, MessageRole::Assistant, format!("answer {i}"));
        h.chats.append_message(&assistant).await.unwrap();
    }
    let stray_notice = ChatMessage::new(
        session.id,
        MessageRole::System,
        "Internal error: blip".to_string(),
    );
    h.chats.append_message(&stray_notice).await.unwrap();

    h.service
        .send_message(subject_id, session.id, "question 16")
        .await
        .unwrap();

    let turns = completion.turns.lock().unwrap().clone();
    assert_eq!(turns[0].role, MessageRole::System);
    assert_eq!(turns[1].role, MessageRole::System);

    let replayed: Vec<String> = turns[2..turns.len() - 1]
        .iter()
        .map(|t| t.content.clone())
        .collect();
    assert_eq!(
        replayed,
        vec![
            "answer 11",
            "question 12",
            "answer 12",
            "question 13",
            "answer 13",
            "question 14",
            "answer 14",
            "question 15",
            "answer 15",
        ]
    );
    assert!(turns.iter().all(|t| t.content != "Internal error: blip"));
    assert_eq!(turns.last().unwrap().content, "question 16");
    assert_eq!(turns.last().unwrap().role, MessageRole::User);
}

#[tokio::test]
async fn given_assistant_message_when_rating_twice_then_second_attempt_rejected() {
    let h = harness(
        free_limits(Limit::Capped(10_000), Limit::Capped(50)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects).await;
    let document_id = seed_processed_document(&h.documents, subject_id).await;
    let (session, _) = h
        .service
        .create_session(subject_id, document_id)
        .await
        .unwrap();

    let exchange = h
        .service
        .send_message(subject_id, session.id, "Explain clause one")
        .await
        .unwrap();
    let assistant = exchange.assistant_message.unwrap();

    let feedback = h
        .service
        .record_feedback(subject_id, assistant.id, 5, "Very clear")
        .await
        .unwrap();
    assert_eq!(feedback.rating, 5);

    let second = h
        .service
        .record_feedback(subject_id, assistant.id, 1, "changed my mind")
        .await;
    assert!(matches!(second, Err(ChatError::AlreadyRated)));
}

#[tokio::test]
async fn given_user_message_when_rating_then_not_eligible() {
    let h = harness(
        free_limits(Limit::Capped(10_000), Limit::Capped(50)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects).await;
    let document_id = seed_processed_document(&h.documents, subject_id).await;
    let (session, _) = h
        .service
        .create_session(subject_id, document_id)
        .await
        .unwrap();

    let exchange = h
        .service
        .send_message(subject_id, session.id, "A question")
        .await
        .unwrap();

    let result = h
        .service
        .record_feedback(subject_id, exchange.user_message.id, 4, "")
        .await;

    assert!(matches!(result, Err(ChatError::NotEligible)));
}

#[tokio::test]
async fn given_out_of_range_rating_when_rating_then_rejected() {
    let h = harness(
        free_limits(Limit::Capped(10_000), Limit::Capped(50)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects).await;

    let result = h
        .service
        .record_feedback(subject_id, lexchat::domain::MessageId::new(), 6, "")
        .await;

    assert!(matches!(result, Err(ChatError::InvalidRating)));
}

#[tokio::test]
async fn given_foreign_session_when_sending_then_not_found() {
    let h = harness(
        free_limits(Limit::Capped(10_000), Limit::Capped(50)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let owner_id = seed_subject(&h.subjects).await;
    let document_id = seed_processed_document(&h.documents, owner_id).await;
    let (session, _) = h
        .service
        .create_session(owner_id, document_id)
        .await
        .unwrap();

    let intruder = Subject::new("other@example.com".to_string(), Plan::Free);
    h.subjects.create(&intruder).await.unwrap();

    let result = h
        .service
        .send_message(intruder.id, session.id, "let me in")
        .await;

    assert!(matches!(result, Err(ChatError::NotFound(_))));
}

#[tokio::test]
async fn given_unknown_session_when_sending_then_not_found() {
    let h = harness(
        free_limits(Limit::Capped(10_000), Limit::Capped(50)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects).await;

    let result = h
        .service
        .send_message(subject_id, SessionId::new(), "hello?")
        .await;

    assert!(matches!(result, Err(ChatError::NotFound(_))));
}
