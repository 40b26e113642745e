use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::application::ports::{
    BlobStore, BlobStoreError, CompletionClient, CompletionError, DocumentRepository,
    ExtractionError, FileLoader, RepositoryError, SubjectRepository,
};
use crate::domain::{
    AnalysisKind, ContentType, Document, DocumentId, DocumentStatus, ProcessingLogEntry,
    ProcessingStep, StepOutcome, Subject, SubjectId,
};

use super::{PromptAssembler, QuotaLedger};

#[derive(Debug, Clone)]
pub struct ProcessingSettings {
    pub summary_max_tokens: u32,
    pub analysis_max_tokens: u32,
    /// Bound on one full-document completion call.
    pub completion_timeout: Duration,
    /// Token cost assumed when gating a reprocess or analysis request.
    pub reprocess_token_estimate: u64,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            summary_max_tokens: 1000,
            analysis_max_tokens: 1500,
            completion_timeout: Duration::from_secs(300),
            reprocess_token_estimate: 1000,
        }
    }
}

/// Orchestrates upload acceptance and the extract → summarize → persist
/// pipeline, one run at a time per document.
pub struct ProcessingService {
    documents: Arc<dyn DocumentRepository>,
    subjects: Arc<dyn SubjectRepository>,
    blobs: Arc<dyn BlobStore>,
    file_loader: Arc<dyn FileLoader>,
    completion: Arc<dyn CompletionClient>,
    prompts: PromptAssembler,
    ledger: QuotaLedger,
    settings: ProcessingSettings,
}

impl ProcessingService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        subjects: Arc<dyn SubjectRepository>,
        blobs: Arc<dyn BlobStore>,
        file_loader: Arc<dyn FileLoader>,
        completion: Arc<dyn CompletionClient>,
        prompts: PromptAssembler,
        ledger: QuotaLedger,
        settings: ProcessingSettings,
    ) -> Self {
        Self {
            documents,
            subjects,
            blobs,
            file_loader,
            completion,
            prompts,
            ledger,
            settings,
        }
    }

    /// Accepts an upload and runs the processing pipeline inline. Quota
    /// rejection happens before anything is persisted; processing failures
    /// are reported through the returned document's `Error` status rather
    /// than as a fault.
    #[tracing::instrument(skip(self, data), fields(subject_id = %subject_id.as_uuid(), title = %title, bytes = data.len()))]
    pub async fn upload(
        &self,
        subject_id: SubjectId,
        title: String,
        content_type: ContentType,
        data: Vec<u8>,
    ) -> Result<Document, ProcessingError> {
        let mut subject = self.fetch_subject(subject_id).await?;

        if self
            .ledger
            .reset_if_period_elapsed(&mut subject.quota, Utc::now())
        {
            self.subjects.save_quota(subject.id, &subject.quota).await?;
        }
        if !self.ledger.can_upload_document(subject.plan, &subject.quota) {
            return Err(ProcessingError::QuotaExceeded);
        }

        let storage_path = format!("documents/{}/{}", subject_id.as_uuid(), Uuid::new_v4());
        let size_bytes = data.len() as u64;
        self.blobs.put(&storage_path, data).await?;

        let document = Document::new(subject_id, title, content_type, storage_path, size_bytes);
        self.documents.create(&document).await?;
        self.subjects.add_documents_used(subject_id, 1).await?;
        self.documents
            .append_log(&ProcessingLogEntry::new(
                document.id,
                ProcessingStep::Upload,
                StepOutcome::Completed,
                "Document uploaded successfully",
            ))
            .await?;

        tracing::info!(document_id = %document.id.as_uuid(), "Document accepted, starting processing");

        self.run(document).await
    }

    /// Re-runs the pipeline for an existing document. Rejected while a run
    /// is in flight and gated by the token quota with a fixed estimate.
    #[tracing::instrument(skip(self), fields(subject_id = %subject_id.as_uuid(), document_id = %document_id.as_uuid()))]
    pub async fn reprocess(
        &self,
        subject_id: SubjectId,
        document_id: DocumentId,
    ) -> Result<Document, ProcessingError> {
        let mut subject = self.fetch_subject(subject_id).await?;
        let document = self.fetch_owned_document(subject_id, document_id).await?;

        if document.status == DocumentStatus::Processing {
            return Err(ProcessingError::AlreadyProcessing);
        }

        if self
            .ledger
            .reset_if_period_elapsed(&mut subject.quota, Utc::now())
        {
            self.subjects.save_quota(subject.id, &subject.quota).await?;
        }
        if !self.ledger.can_consume_tokens(
            subject.plan,
            &subject.quota,
            self.settings.reprocess_token_estimate,
        ) {
            return Err(ProcessingError::TokenQuotaExceeded);
        }

        self.run(document).await
    }

    /// Runs a focused analysis against a processed document. Failures
    /// surface to the caller; the document itself is left untouched.
    #[tracing::instrument(skip(self), fields(subject_id = %subject_id.as_uuid(), document_id = %document_id.as_uuid(), kind = %kind))]
    pub async fn analyze(
        &self,
        subject_id: SubjectId,
        document_id: DocumentId,
        kind: AnalysisKind,
    ) -> Result<AnalysisReport, ProcessingError> {
        let mut subject = self.fetch_subject(subject_id).await?;
        let document = self.fetch_owned_document(subject_id, document_id).await?;

        if document.status != DocumentStatus::Processed {
            return Err(ProcessingError::DocumentNotReady);
        }

        if self
            .ledger
            .reset_if_period_elapsed(&mut subject.quota, Utc::now())
        {
            self.subjects.save_quota(subject.id, &subject.quota).await?;
        }
        if !self.ledger.can_consume_tokens(
            subject.plan,
            &subject.quota,
            self.settings.reprocess_token_estimate,
        ) {
            return Err(ProcessingError::TokenQuotaExceeded);
        }

        let turns = self.prompts.analysis_prompt(kind, &document.extracted_text);
        let completion = tokio::time::timeout(
            self.settings.completion_timeout,
            self.completion
                .complete(&turns, self.settings.analysis_max_tokens),
        )
        .await
        .map_err(|_| CompletionError::Timeout)??;

        self.subjects
            .add_tokens_used(subject_id, u64::from(completion.tokens_used))
            .await?;
        self.documents
            .append_log(&ProcessingLogEntry::new(
                document.id,
                ProcessingStep::Analysis,
                StepOutcome::Completed,
                format!("{} analysis generated", kind),
            ))
            .await?;

        Ok(AnalysisReport {
            kind,
            result: completion.text,
            tokens_used: completion.tokens_used,
        })
    }

    /// One pipeline run. The Processing transition is a compare-and-set so
    /// concurrent runs on the same document are rejected; any failure past
    /// that point lands the document in `Error` with a failure log entry.
    async fn run(&self, document: Document) -> Result<Document, ProcessingError> {
        if !self.documents.try_begin_processing(document.id).await? {
            return Err(ProcessingError::AlreadyProcessing);
        }
        self.documents
            .append_log(&ProcessingLogEntry::new(
                document.id,
                ProcessingStep::ProcessingStart,
                StepOutcome::Started,
                "Starting document processing",
            ))
            .await?;

        match self.summarize(&document).await {
            Ok(()) => {
                self.documents
                    .append_log(&ProcessingLogEntry::new(
                        document.id,
                        ProcessingStep::ProcessingComplete,
                        StepOutcome::Completed,
                        "Document processed successfully",
                    ))
                    .await?;
                tracing::info!(document_id = %document.id.as_uuid(), "Document processing complete");
            }
            Err(e) => {
                tracing::warn!(document_id = %document.id.as_uuid(), error = %e, "Document processing failed");
                self.documents.mark_error(document.id).await?;
                self.documents
                    .append_log(&ProcessingLogEntry::new(
                        document.id,
                        ProcessingStep::ProcessingError,
                        StepOutcome::Failed,
                        format!("Processing failed: {}", e),
                    ))
                    .await?;
            }
        }

        self.documents
            .get(document.id)
            .await?
            .ok_or_else(|| ProcessingError::NotFound("document".to_string()))
    }

    async fn summarize(&self, document: &Document) -> Result<(), ProcessingError> {
        let data = self.blobs.fetch(&document.storage_path).await?;
        let text = self
            .file_loader
            .extract_text(&data, document.content_type)
            .await?;

        let turns = self.prompts.summary_prompt(&text);
        let completion = tokio::time::timeout(
            self.settings.completion_timeout,
            self.completion
                .complete(&turns, self.settings.summary_max_tokens),
        )
        .await
        .map_err(|_| CompletionError::Timeout)??;

        // The provider already consumed these tokens, so they are charged
        // even if persisting the results fails below.
        self.subjects
            .add_tokens_used(document.subject_id, u64::from(completion.tokens_used))
            .await?;

        self.documents
            .store_results(
                document.id,
                &text,
                &completion.text,
                completion.tokens_used,
                Utc::now(),
            )
            .await?;

        Ok(())
    }

    async fn fetch_subject(&self, subject_id: SubjectId) -> Result<Subject, ProcessingError> {
        self.subjects
            .get(subject_id)
            .await?
            .ok_or_else(|| ProcessingError::NotFound("subject".to_string()))
    }

    async fn fetch_owned_document(
        &self,
        subject_id: SubjectId,
        document_id: DocumentId,
    ) -> Result<Document, ProcessingError> {
        let document = self
            .documents
            .get(document_id)
            .await?
            .ok_or_else(|| ProcessingError::NotFound("document".to_string()))?;
        if document.subject_id != subject_id {
            return Err(ProcessingError::NotFound("document".to_string()));
        }
        Ok(document)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub kind: AnalysisKind,
    pub result: String,
    pub tokens_used: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("document upload limit reached for the current plan")]
    QuotaExceeded,
    #[error("AI token limit reached for the current plan")]
    TokenQuotaExceeded,
    #[error("document is already being processed")]
    AlreadyProcessing,
    #[error("document must be processed first")]
    DocumentNotReady,
    #[error("{0} not found")]
    NotFound(String),
    #[error("extraction: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("completion: {0}")]
    Completion(#[from] CompletionError),
    #[error("storage: {0}")]
    Blob(#[from] BlobStoreError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
