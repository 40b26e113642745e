use std::sync::Arc;

use crate::application::services::{ChatService, ProcessingService};

#[derive(Clone)]
pub struct AppState {
    pub processing_service: Arc<ProcessingService>,
    pub chat_service: Arc<ChatService>,
}
