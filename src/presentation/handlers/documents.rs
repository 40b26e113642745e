use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::ProcessingError;
use crate::domain::{AnalysisKind, ContentType, Document, DocumentId};
use crate::presentation::state::AppState;

use super::{subject_id_from_headers, ErrorResponse};

#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub title: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub status: String,
    pub summary: String,
    pub summary_tokens: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: document.id.as_uuid().to_string(),
            title: document.title,
            content_type: document.content_type.as_mime().to_string(),
            size_bytes: document.size_bytes,
            status: document.status.as_str().to_string(),
            summary: document.summary,
            summary_tokens: document.summary_tokens,
            created_at: document.created_at,
            updated_at: document.updated_at,
            processed_at: document.processed_at,
        }
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub document: DocumentResponse,
}

#[tracing::instrument(skip(state, headers, multipart))]
pub async fn upload_document_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let subject_id = match subject_id_from_headers(&headers) {
        Ok(id) => id,
        Err(rejection) => return rejection.into_response(),
    };

    let mut title: Option<String> = None;
    let mut file: Option<(String, String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read multipart");
                return bad_request(format!("Failed to read multipart: {}", e));
            }
        };

        let name = field.name().unwrap_or("").to_string();
        if name == "title" {
            match field.text().await {
                Ok(text) => title = Some(text),
                Err(e) => return bad_request(format!("Failed to read title: {}", e)),
            }
        } else if name == "file" || field.file_name().is_some() {
            let filename = field.file_name().unwrap_or("unknown").to_string();
            let mime = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            match field.bytes().await {
                Ok(data) => file = Some((filename, mime, data.to_vec())),
                Err(e) => return bad_request(format!("Failed to read file: {}", e)),
            }
        }
    }

    let Some((filename, mime, data)) = file else {
        tracing::warn!("Upload request with no file");
        return bad_request("No file uploaded".to_string());
    };

    let Some(content_type) = ContentType::from_mime(&mime) else {
        tracing::warn!(content_type = %mime, "Unsupported content type");
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(ErrorResponse {
                error: format!("Unsupported content type: {}", mime),
            }),
        )
            .into_response();
    };

    let title = title.unwrap_or(filename);
    match state
        .processing_service
        .upload(subject_id, title, content_type, data)
        .await
    {
        Ok(document) => (
            StatusCode::CREATED,
            Json(UploadResponse {
                message: "Document uploaded successfully".to_string(),
                document: document.into(),
            }),
        )
            .into_response(),
        Err(e) => processing_error_response(e),
    }
}

#[tracing::instrument(skip(state, headers))]
pub async fn reprocess_document_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(document_id): Path<Uuid>,
) -> Response {
    let subject_id = match subject_id_from_headers(&headers) {
        Ok(id) => id,
        Err(rejection) => return rejection.into_response(),
    };

    match state
        .processing_service
        .reprocess(subject_id, DocumentId::from_uuid(document_id))
        .await
    {
        Ok(document) => {
            (StatusCode::OK, Json(DocumentResponse::from(document))).into_response()
        }
        Err(e) => processing_error_response(e),
    }
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub analysis_type: String,
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub analysis_type: String,
    pub result: String,
    pub tokens_used: u32,
}

#[tracing::instrument(skip(state, headers, request))]
pub async fn analyze_document_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(document_id): Path<Uuid>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    let subject_id = match subject_id_from_headers(&headers) {
        Ok(id) => id,
        Err(rejection) => return rejection.into_response(),
    };

    let kind: AnalysisKind = match request.analysis_type.parse() {
        Ok(kind) => kind,
        Err(e) => return bad_request(e),
    };

    match state
        .processing_service
        .analyze(subject_id, DocumentId::from_uuid(document_id), kind)
        .await
    {
        Ok(report) => (
            StatusCode::OK,
            Json(AnalysisResponse {
                analysis_type: report.kind.as_str().to_string(),
                result: report.result,
                tokens_used: report.tokens_used,
            }),
        )
            .into_response(),
        Err(e) => processing_error_response(e),
    }
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}

fn processing_error_response(e: ProcessingError) -> Response {
    let status = match &e {
        ProcessingError::QuotaExceeded | ProcessingError::TokenQuotaExceeded => {
            StatusCode::FORBIDDEN
        }
        ProcessingError::AlreadyProcessing => StatusCode::CONFLICT,
        ProcessingError::DocumentNotReady => StatusCode::BAD_REQUEST,
        ProcessingError::NotFound(_) => StatusCode::NOT_FOUND,
        ProcessingError::Extraction(_)
        | ProcessingError::Completion(_)
        | ProcessingError::Blob(_)
        | ProcessingError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %e, "Document operation failed");
    }

    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}
