use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::application::services::{ChatSettings, ProcessingSettings, PromptSettings};
use crate::domain::{Limit, PlanLimitTable, PlanLimits};

/// Immutable process configuration, built once from the environment and
/// passed into each component at construction time.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub llm: LlmSettings,
    pub prompts: PromptBudgetSettings,
    pub quota: QuotaSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub summary_max_tokens: u32,
    pub chat_max_tokens: u32,
    pub analysis_max_tokens: u32,
    pub summary_timeout_seconds: u64,
    pub chat_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptBudgetSettings {
    pub summary_text_budget: usize,
    pub grounding_text_budget: usize,
    pub analysis_text_budget: usize,
    pub history_window: usize,
}

/// Plan limits use the original sentinel convention: negative = unlimited.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaSettings {
    pub free_documents_per_month: i64,
    pub free_ai_tokens_per_month: i64,
    pub free_chat_messages_per_document: i64,
    pub premium_documents_per_month: i64,
    pub premium_ai_tokens_per_month: i64,
    pub premium_chat_messages_per_document: i64,
    pub reprocess_token_estimate: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            server: ServerSettings {
                host: env_or("SERVER_HOST", "0.0.0.0".to_string()),
                port: env_or("SERVER_PORT", 3000),
            },
            database: DatabaseSettings {
                url: std::env::var("DATABASE_URL").ok(),
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", 5),
            },
            storage: StorageSettings {
                root: env_or("STORAGE_ROOT", "./data/blobs".to_string()),
            },
            llm: LlmSettings {
                api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
                base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1".to_string()),
                model: env_or("OPENAI_MODEL", "gpt-4o-mini".to_string()),
                temperature: env_or("OPENAI_TEMPERATURE", 0.7),
                summary_max_tokens: env_or("SUMMARY_MAX_TOKENS", 1000),
                chat_max_tokens: env_or("CHAT_MAX_TOKENS", 1500),
                analysis_max_tokens: env_or("ANALYSIS_MAX_TOKENS", 1500),
                summary_timeout_seconds: env_or("SUMMARY_TIMEOUT_SECONDS", 300),
                chat_timeout_seconds: env_or("CHAT_TIMEOUT_SECONDS", 60),
            },
            prompts: PromptBudgetSettings {
                summary_text_budget: env_or("SUMMARY_TEXT_BUDGET", 8000),
                grounding_text_budget: env_or("GROUNDING_TEXT_BUDGET", 6000),
                analysis_text_budget: env_or("ANALYSIS_TEXT_BUDGET", 7000),
                history_window: env_or("CHAT_HISTORY_WINDOW", 10),
            },
            quota: QuotaSettings {
                free_documents_per_month: env_or("FREE_DOCUMENTS_PER_MONTH", 3),
                free_ai_tokens_per_month: env_or("FREE_AI_TOKENS_PER_MONTH", 50_000),
                free_chat_messages_per_document: env_or("FREE_CHAT_MESSAGES_PER_DOCUMENT", 50),
                premium_documents_per_month: env_or("PREMIUM_DOCUMENTS_PER_MONTH", -1),
                premium_ai_tokens_per_month: env_or("PREMIUM_AI_TOKENS_PER_MONTH", -1),
                premium_chat_messages_per_document: env_or(
                    "PREMIUM_CHAT_MESSAGES_PER_DOCUMENT",
                    -1,
                ),
                reprocess_token_estimate: env_or("REPROCESS_TOKEN_ESTIMATE", 1000),
            },
        }
    }

    pub fn plan_limit_table(&self) -> PlanLimitTable {
        PlanLimitTable {
            free: PlanLimits {
                documents_per_month: Limit::from_config(self.quota.free_documents_per_month),
                ai_tokens_per_month: Limit::from_config(self.quota.free_ai_tokens_per_month),
                chat_messages_per_document: Limit::from_config(
                    self.quota.free_chat_messages_per_document,
                ),
            },
            premium: PlanLimits {
                documents_per_month: Limit::from_config(self.quota.premium_documents_per_month),
                ai_tokens_per_month: Limit::from_config(self.quota.premium_ai_tokens_per_month),
                chat_messages_per_document: Limit::from_config(
                    self.quota.premium_chat_messages_per_document,
                ),
            },
        }
    }

    pub fn prompt_settings(&self) -> PromptSettings {
        PromptSettings {
            summary_text_budget: self.prompts.summary_text_budget,
            grounding_text_budget: self.prompts.grounding_text_budget,
            analysis_text_budget: self.prompts.analysis_text_budget,
            history_window: self.prompts.history_window,
        }
    }

    pub fn processing_settings(&self) -> ProcessingSettings {
        ProcessingSettings {
            summary_max_tokens: self.llm.summary_max_tokens,
            analysis_max_tokens: self.llm.analysis_max_tokens,
            completion_timeout: Duration::from_secs(self.llm.summary_timeout_seconds),
            reprocess_token_estimate: self.quota.reprocess_token_estimate,
        }
    }

    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            chat_max_tokens: self.llm.chat_max_tokens,
            completion_timeout: Duration::from_secs(self.llm.chat_timeout_seconds),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
