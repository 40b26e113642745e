mod client_factory;
mod fallback_client;
mod openai_client;

pub use client_factory::create_completion_client;
pub use fallback_client::FallbackCompletionClient;
pub use openai_client::OpenAiCompletionClient;
