mod settings;

pub use settings::{
    DatabaseSettings, LlmSettings, PromptBudgetSettings, QuotaSettings, ServerSettings, Settings,
    StorageSettings,
};
