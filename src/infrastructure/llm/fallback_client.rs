use async_trait::async_trait;

use crate::application::ports::{Completion, CompletionClient, CompletionError, Turn};

const FALLBACK_TEXT: &str = "This is a simulated AI response. Configure a completion \
provider API key to receive real answers.";
const FALLBACK_TOKEN_COST: u32 = 150;
const FALLBACK_MODEL: &str = "offline-fallback";

/// Deterministic stand-in used when no provider credential is configured.
/// It never fails, so the pipeline always completes in unconfigured
/// environments.
#[derive(Default)]
pub struct FallbackCompletionClient;

impl FallbackCompletionClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompletionClient for FallbackCompletionClient {
    async fn complete(
        &self,
        _turns: &[Turn],
        _max_tokens: u32,
    ) -> Result<Completion, CompletionError> {
        Ok(Completion {
            text: FALLBACK_TEXT.to_string(),
            tokens_used: FALLBACK_TOKEN_COST,
            model: FALLBACK_MODEL.to_string(),
        })
    }
}
