use std::sync::Arc;

use crate::application::ports::CompletionClient;
use crate::presentation::config::LlmSettings;

use super::{FallbackCompletionClient, OpenAiCompletionClient};

/// Picks the live provider client, or the offline fallback when no API key
/// is configured.
pub fn create_completion_client(settings: &LlmSettings) -> Arc<dyn CompletionClient> {
    if settings.api_key.trim().is_empty() {
        tracing::warn!("No completion API key configured, falling back to offline responses");
        Arc::new(FallbackCompletionClient::new())
    } else {
        tracing::info!(model = %settings.model, "Using live completion provider");
        Arc::new(OpenAiCompletionClient::new(settings))
    }
}
