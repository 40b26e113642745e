use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::presentation::handlers::{
    analyze_document_handler, create_session_handler, health_handler, reprocess_document_handler,
    send_message_handler, submit_feedback_handler, upload_document_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/documents", post(upload_document_handler))
        .route(
            "/api/v1/documents/{document_id}/reprocess",
            post(reprocess_document_handler),
        )
        .route(
            "/api/v1/documents/{document_id}/analysis",
            post(analyze_document_handler),
        )
        .route("/api/v1/chat/sessions", post(create_session_handler))
        .route(
            "/api/v1/chat/sessions/{session_id}/messages",
            post(send_message_handler),
        )
        .route(
            "/api/v1/chat/messages/{message_id}/feedback",
            post(submit_feedback_handler),
        )
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
