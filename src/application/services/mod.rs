mod chat_service;
mod processing_service;
mod prompt_assembler;
mod quota_ledger;

pub use chat_service::{estimate_message_tokens, ChatError, ChatExchange, ChatService, ChatSettings};
pub use processing_service::{
    AnalysisReport, ProcessingError, ProcessingService, ProcessingSettings,
};
pub use prompt_assembler::{PromptAssembler, PromptSettings};
pub use quota_ledger::QuotaLedger;
