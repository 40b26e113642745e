mod chat;
mod documents;
mod health;

pub use chat::{create_session_handler, send_message_handler, submit_feedback_handler};
pub use documents::{analyze_document_handler, reprocess_document_handler, upload_document_handler};
pub use health::health_handler;

use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::SubjectId;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// The authenticated subject id, set by the upstream auth layer.
pub(crate) fn subject_id_from_headers(
    headers: &HeaderMap,
) -> Result<SubjectId, (StatusCode, Json<ErrorResponse>)> {
    headers
        .get("x-subject-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .map(SubjectId::from_uuid)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Missing or invalid x-subject-id header".to_string(),
                }),
            )
        })
}
