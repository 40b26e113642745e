use std::sync::Arc;

use chrono::{Datelike, TimeZone, Utc};

use lexchat::application::ports::{
    BlobStore, CompletionClient, Completion, CompletionError, DocumentRepository,
    SubjectRepository, Turn,
};
use lexchat::application::services::{
    ProcessingError, ProcessingService, ProcessingSettings, PromptAssembler, PromptSettings,
    QuotaLedger,
};
use lexchat::domain::{
    AnalysisKind, ContentType, Document, DocumentStatus, Limit, Plan, PlanLimitTable, PlanLimits,
    ProcessingStep, StepOutcome, Subject, SubjectId,
};
use lexchat::infrastructure::llm::FallbackCompletionClient;
use lexchat::infrastructure::persistence::{MemoryDocumentRepository, MemorySubjectRepository};
use lexchat::infrastructure::storage::ObjectStoreBlobStore;
use lexchat::infrastructure::text_processing::CompositeFileLoader;

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

struct Harness {
    service: ProcessingService,
    documents: Arc<MemoryDocumentRepository>,
    subjects: Arc<MemorySubjectRepository>,
    blobs: Arc<ObjectStoreBlobStore>,
}

fn free_limits(documents: Limit, tokens: Limit) -> PlanLimitTable {
    PlanLimitTable {
        free: PlanLimits {
            documents_per_month: documents,
            ai_tokens_per_month: tokens,
            chat_messages_per_document: Limit::Capped(50),
        },
        premium: PlanLimitTable::default().premium,
    }
}

fn harness(limits: PlanLimitTable, completion: Arc<dyn CompletionClient>) -> Harness {
    let documents = Arc::new(MemoryDocumentRepository::new());
    let subjects = Arc::new(MemorySubjectRepository::new());
    let blobs = Arc::new(ObjectStoreBlobStore::in_memory());

    let service = ProcessingService::new(
        documents.clone(),
        subjects.clone(),
        blobs.clone(),
        Arc::new(CompositeFileLoader::with_default_adapters()),
        completion,
        PromptAssembler::new(PromptSettings::default()),
        QuotaLedger::new(limits),
        ProcessingSettings::default(),
    );

    Harness {
        service,
        documents,
        subjects,
        blobs,
    }
}

async fn seed_subject(subjects: &MemorySubjectRepository, plan: Plan) -> SubjectId {
    let subject = Subject::new("user@example.com".to_string(), plan);
    subjects.create(&subject).await.unwrap();
    subject.id
}

#[tokio::test]
async fn given_plain_text_upload_when_processing_then_document_reaches_processed() {
    let h = harness(
        free_limits(Limit::Capped(1), Limit::Capped(10_000)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects, Plan::Free).await;

    let document = h
        .service
        .upload(
            subject_id,
            "Contract".to_string(),
            ContentType::Text,
            b"Contract between A and B.".to_vec(),
        )
        .await
        .unwrap();

    assert_eq!(document.status, DocumentStatus::Processed);
    assert_eq!(document.extracted_text, "Contract between A and B.");
    assert!(!document.summary.is_empty());
    assert_eq!(document.summary_tokens, 150);
    assert!(document.processed_at.is_some());

    let subject = h.subjects.get(subject_id).await.unwrap().unwrap();
    assert_eq!(subject.quota.documents_used, 1);
    assert_eq!(subject.quota.ai_tokens_used, 150);

    let logs = h.documents.logs(document.id).await.unwrap();
    let steps: Vec<(ProcessingStep, StepOutcome)> =
        logs.iter().map(|entry| (entry.step, entry.outcome)).collect();
    assert_eq!(
        steps,
        vec![
            (ProcessingStep::Upload, StepOutcome::Completed),
            (ProcessingStep::ProcessingStart, StepOutcome::Started),
            (ProcessingStep::ProcessingComplete, StepOutcome::Completed),
        ]
    );
}

#[tokio::test]
async fn given_empty_file_when_processing_then_document_errors_without_summary() {
    let h = harness(
        free_limits(Limit::Capped(3), Limit::Capped(10_000)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects, Plan::Free).await;

    let document = h
        .service
        .upload(
            subject_id,
            "Blank".to_string(),
            ContentType::Text,
            Vec::new(),
        )
        .await
        .unwrap();

    assert_eq!(document.status, DocumentStatus::Error);
    assert!(document.summary.is_empty());
    assert!(document.processed_at.is_none());

    // Upload was charged; the failed summarization step cost no tokens.
    let subject = h.subjects.get(subject_id).await.unwrap().unwrap();
    assert_eq!(subject.quota.documents_used, 1);
    assert_eq!(subject.quota.ai_tokens_used, 0);

    let logs = h.documents.logs(document.id).await.unwrap();
    let last = logs.last().unwrap();
    assert_eq!(last.step, ProcessingStep::ProcessingError);
    assert_eq!(last.outcome, StepOutcome::Failed);
    assert!(last.message.contains("no extractable text"));
}

#[tokio::test]
async fn given_document_limit_reached_when_uploading_then_rejected_before_persistence() {
    let h = harness(
        free_limits(Limit::Capped(1), Limit::Capped(10_000)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects, Plan::Free).await;

    h.service
        .upload(
            subject_id,
            "First".to_string(),
            ContentType::Text,
            b"first document".to_vec(),
        )
        .await
        .unwrap();

    let result = h
        .service
        .upload(
            subject_id,
            "Second".to_string(),
            ContentType::Text,
            b"second document".to_vec(),
        )
        .await;

    assert!(matches!(result, Err(ProcessingError::QuotaExceeded)));

    let subject = h.subjects.get(subject_id).await.unwrap().unwrap();
    assert_eq!(subject.quota.documents_used, 1);
}

#[tokio::test]
async fn given_document_already_processing_when_reprocessing_then_rejected() {
    let h = harness(
        free_limits(Limit::Capped(3), Limit::Capped(10_000)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects, Plan::Free).await;

    let document = Document::new(
        subject_id,
        "Stuck".to_string(),
        ContentType::Text,
        "documents/stuck".to_string(),
        5,
    );
    h.documents.create(&document).await.unwrap();
    assert!(h.documents.try_begin_processing(document.id).await.unwrap());

    let result = h.service.reprocess(subject_id, document.id).await;

    assert!(matches!(result, Err(ProcessingError::AlreadyProcessing)));
}

#[tokio::test]
async fn given_token_budget_below_estimate_when_reprocessing_then_rejected() {
    let h = harness(
        free_limits(Limit::Capped(3), Limit::Capped(500)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects, Plan::Free).await;

    let document = Document::new(
        subject_id,
        "Doc".to_string(),
        ContentType::Text,
        "documents/doc".to_string(),
        5,
    );
    h.documents.create(&document).await.unwrap();

    let result = h.service.reprocess(subject_id, document.id).await;

    assert!(matches!(result, Err(ProcessingError::TokenQuotaExceeded)));
}

#[tokio::test]
async fn given_errored_document_when_reprocessing_then_it_recovers() {
    let h = harness(
        free_limits(Limit::Capped(3), Limit::Capped(10_000)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects, Plan::Free).await;

    let mut document = Document::new(
        subject_id,
        "Recoverable".to_string(),
        ContentType::Text,
        "documents/recoverable".to_string(),
        15,
    );
    document.status = DocumentStatus::Error;
    h.documents.create(&document).await.unwrap();
    h.blobs
        .put("documents/recoverable", b"A binding agreement.".to_vec())
        .await
        .unwrap();

    let reprocessed = h.service.reprocess(subject_id, document.id).await.unwrap();

    assert_eq!(reprocessed.status, DocumentStatus::Processed);
    assert_eq!(reprocessed.extracted_text, "A binding agreement.");
    assert!(!reprocessed.summary.is_empty());
}

#[tokio::test]
async fn given_foreign_document_when_reprocessing_then_not_found() {
    let h = harness(
        free_limits(Limit::Capped(3), Limit::Capped(10_000)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let owner_id = seed_subject(&h.subjects, Plan::Free).await;
    let intruder = Subject::new("other@example.com".to_string(), Plan::Free);
    h.subjects.create(&intruder).await.unwrap();

    let document = Document::new(
        owner_id,
        "Private".to_string(),
        ContentType::Text,
        "documents/private".to_string(),
        5,
    );
    h.documents.create(&document).await.unwrap();

    let result = h.service.reprocess(intruder.id, document.id).await;

    assert!(matches!(result, Err(ProcessingError::NotFound(_))));
}

#[tokio::test]
async fn given_unprocessed_document_when_analyzing_then_not_ready() {
    let h = harness(
        free_limits(Limit::Capped(3), Limit::Capped(10_000)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects, Plan::Free).await;

    let document = Document::new(
        subject_id,
        "Pending".to_string(),
        ContentType::Text,
        "documents/pending".to_string(),
        5,
    );
    h.documents.create(&document).await.unwrap();

    let result = h
        .service
        .analyze(subject_id, document.id, AnalysisKind::Risks)
        .await;

    assert!(matches!(result, Err(ProcessingError::DocumentNotReady)));
}

#[tokio::test]
async fn given_processed_document_when_analyzing_then_report_and_tokens_recorded() {
    let h = harness(
        free_limits(Limit::Capped(3), Limit::Capped(10_000)),
        Arc::new(FallbackCompletionClient::new()),
    );
    let subject_id = seed_subject(&h.subjects, Plan::Free).await;

    let document = h
        .service
        .upload(
            subject_id,
            "Agreement".to_string(),
            ContentType::Text,
            b"Payment is due within 30 days of invoice.".to_vec(),
        )
        .await
        .unwrap();

    let report = h
        .service
        .analyze(subject_id, document.id, AnalysisKind::Deadlines)
        .await
        .unwrap();

    assert_eq!(report.kind, AnalysisKind::Deadlines);
    assert!(!report.result.is_empty());
    assert_eq!(report.tokens_used, 150);

    // Summary run cost 150, analysis another 150.
    let subject = h.subjects.get(subject_id).await.unwrap().unwrap();
    assert_eq!(subject.quota.ai_tokens_used, 300);

    let logs = h.documents.logs(document.id).await.unwrap();
    let last = logs.last().unwrap();
    assert_eq!(last.step, ProcessingStep::Analysis);
    assert_eq!(last.outcome, StepOutcome::Completed);
}

#[tokio::test]
async fn given_failing_completion_backend_when_processing_then_document_errors() {
    let h = harness(
        free_limits(Limit::Capped(3), Limit::Capped(10_000)),
        Arc::new(FailingCompletionClient),
    );
    let subject_id = seed_subject(&h.subjects, Plan::Free).await;

    let document = h
        .service
        .upload(
            subject_id,
            "Doomed".to_string(),
            ContentType::Text,
            b"Some valid text.".to_vec(),
        )
        .await
        .unwrap();

    assert_eq!(document.status, DocumentStatus::Error);
    assert!(document.summary.is_empty());

    let subject = h.subjects.get(subject_id).await.unwrap().unwrap();
    assert_eq!(subject.quota.ai_tokens_used, 0);

    let logs = h.documents.logs(document.id).await.unwrap();
    let last = logs.last().unwrap();
    assert_eq!(last.step, ProcessingStep::ProcessingError);
    assert!(last.message.contains("backend unavailable"));
}

#[tokio::test]
async fn given_counters_from_previous_month_when_uploading_then_period_resets_first() {
    let h = harness(
        free_limits(Limit::Capped(3), Limit::Capped(10_000)),
        Arc::new(FallbackCompletionClient::new()),
    );

    let mut subject = Subject::new("user@example.com".to_string(), Plan::Free);
    subject.quota.plan_period_start = Utc.with_ymd_and_hms(2020, 1, 15, 8, 0, 0).unwrap();
    subject.quota.documents_used = 3;
    subject.quota.ai_tokens_used = 10_000;
    h.subjects.create(&subject).await.unwrap();

    let document = h
        .service
        .upload(
            subject.id,
            "Fresh month".to_string(),
            ContentType::Text,
            b"New period, new budget.".to_vec(),
        )
        .await
        .unwrap();

    assert_eq!(document.status, DocumentStatus::Processed);

    let stored = h.subjects.get(subject.id).await.unwrap().unwrap();
    assert_eq!(stored.quota.documents_used, 1);
    assert_eq!(stored.quota.ai_tokens_used, 150);
    assert!(stored.quota.plan_period_start.year() > 2020);
}
