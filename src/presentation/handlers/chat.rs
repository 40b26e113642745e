use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::application::services::{ChatError, ChatExchange};
use crate::domain::{ChatMessage, ChatSession, DocumentId, MessageId, SessionId};
use crate::presentation::state::AppState;

use super::{subject_id_from_headers, ErrorResponse};

#[derive(Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub document_id: String,
    pub title: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChatSession> for SessionResponse {
    fn from(session: ChatSession) -> Self {
        Self {
            id: session.id.as_uuid().to_string(),
            document_id: session.document_id.as_uuid().to_string(),
            title: session.title,
            is_active: session.is_active,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub role: String,
    pub content: String,
    pub tokens_used: u32,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for MessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id.as_uuid().to_string(),
            role: message.role.as_str().to_string(),
            content: message.content,
            tokens_used: message.tokens_used,
            metadata: Value::Object(message.metadata),
            created_at: message.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub document_id: Uuid,
}

#[tracing::instrument(skip(state, headers, request))]
pub async fn create_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateSessionRequest>,
) -> Response {
    let subject_id = match subject_id_from_headers(&headers) {
        Ok(id) => id,
        Err(rejection) => return rejection.into_response(),
    };

    match state
        .chat_service
        .create_session(subject_id, DocumentId::from_uuid(request.document_id))
        .await
    {
        Ok((session, created)) => {
            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(SessionResponse::from(session))).into_response()
        }
        Err(e) => chat_error_response(e),
    }
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct SendMessageResponse {
    pub user_message: MessageResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_message: Option<MessageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<MessageResponse>,
}

impl From<ChatExchange> for SendMessageResponse {
    fn from(exchange: ChatExchange) -> Self {
        Self {
            user_message: exchange.user_message.into(),
            assistant_message: exchange.assistant_message.map(Into::into),
            error_message: exchange.error_message.map(Into::into),
        }
    }
}

#[tracing::instrument(skip(state, headers, request))]
pub async fn send_message_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Response {
    let subject_id = match subject_id_from_headers(&headers) {
        Ok(id) => id,
        Err(rejection) => return rejection.into_response(),
    };

    match state
        .chat_service
        .send_message(
            subject_id,
            SessionId::from_uuid(session_id),
            &request.message,
        )
        .await
    {
        Ok(exchange) => {
            (StatusCode::OK, Json(SendMessageResponse::from(exchange))).into_response()
        }
        Err(e) => chat_error_response(e),
    }
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub message_id: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[tracing::instrument(skip(state, headers, request))]
pub async fn submit_feedback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(message_id): Path<Uuid>,
    Json(request): Json<FeedbackRequest>,
) -> Response {
    let subject_id = match subject_id_from_headers(&headers) {
        Ok(id) => id,
        Err(rejection) => return rejection.into_response(),
    };

    match state
        .chat_service
        .record_feedback(
            subject_id,
            MessageId::from_uuid(message_id),
            request.rating,
            &request.comment,
        )
        .await
    {
        Ok(feedback) => (
            StatusCode::CREATED,
            Json(FeedbackResponse {
                message_id: feedback.message_id.as_uuid().to_string(),
                rating: feedback.rating,
                comment: feedback.comment,
                created_at: feedback.created_at,
            }),
        )
            .into_response(),
        Err(e) => chat_error_response(e),
    }
}

fn chat_error_response(e: ChatError) -> Response {
    let status = match &e {
        ChatError::DocumentNotReady
        | ChatError::InvalidMessage
        | ChatError::AlreadyRated
        | ChatError::InvalidRating => StatusCode::BAD_REQUEST,
        ChatError::MessageQuotaExceeded | ChatError::TokenQuotaExceeded => StatusCode::FORBIDDEN,
        ChatError::NotEligible | ChatError::NotFound(_) => StatusCode::NOT_FOUND,
        ChatError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %e, "Chat operation failed");
    }

    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}
