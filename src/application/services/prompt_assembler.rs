use crate::application::ports::Turn;
use crate::domain::{AnalysisKind, ChatMessage, MessageRole};

const SUMMARY_PERSONA: &str = "You are a legal assistant specialized in analyzing legal \
documents. Your task is to produce a clear, understandable summary of the provided document, \
using plain language that can be followed by people without legal training.\n\n\
Instructions:\n\
1. Identify the kind of document (contract, statute, court decision, etc.)\n\
2. Highlight the main and most important points\n\
3. Explain complex legal terms in plain language\n\
4. Organize the summary in a logical, structured way\n\
5. Keep the tone professional but approachable";

const CHAT_PERSONA: &str = "You are a specialized legal assistant helping users understand \
legal documents. You have access to the full text of the document and must answer questions \
based on it.\n\n\
Guidelines:\n\
1. Be precise and cite specific parts of the document when relevant\n\
2. Use clear language and avoid unnecessary legal jargon\n\
3. If a question cannot be answered from the document, say so clearly\n\
4. Provide legal context where appropriate\n\
5. Be helpful and educational in your answers";

/// Character budgets and history window for prompt construction.
///
/// Truncation is a hard character cutoff, not sentence-aware.
#[derive(Debug, Clone)]
pub struct PromptSettings {
    pub summary_text_budget: usize,
    pub grounding_text_budget: usize,
    pub analysis_text_budget: usize,
    pub history_window: usize,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            summary_text_budget: 8000,
            grounding_text_budget: 6000,
            analysis_text_budget: 7000,
            history_window: 10,
        }
    }
}

/// Builds the ordered role-tagged turns handed to the completion backend.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    settings: PromptSettings,
}

impl PromptAssembler {
    pub fn new(settings: PromptSettings) -> Self {
        Self { settings }
    }

    pub fn history_window(&self) -> usize {
        self.settings.history_window
    }

    pub fn summary_prompt(&self, extracted_text: &str) -> Vec<Turn> {
        let excerpt = truncate_chars(extracted_text, self.settings.summary_text_budget);
        vec![
            Turn::system(SUMMARY_PERSONA),
            Turn::user(format!(
                "Document for analysis:\n\n{}\n\nPlease provide a comprehensive plain-language \
                 summary of this legal document.",
                excerpt
            )),
        ]
    }

    /// Persona turn, a grounding turn carrying summary plus the leading
    /// slice of the document text, the windowed history (oldest first,
    /// user/assistant roles only) and the new user turn.
    pub fn chat_prompt(
        &self,
        summary: &str,
        extracted_text: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Vec<Turn> {
        let excerpt = truncate_chars(extracted_text, self.settings.grounding_text_budget);
        let mut turns = vec![
            Turn::system(CHAT_PERSONA),
            Turn::system(format!(
                "Document context:\nSummary: {}\n\nFull text (first {} characters):\n{}\n\n---",
                summary, self.settings.grounding_text_budget, excerpt
            )),
        ];

        let window_start = history.len().saturating_sub(self.settings.history_window);
        for message in &history[window_start..] {
            match message.role {
                MessageRole::User => turns.push(Turn::user(message.content.clone())),
                MessageRole::Assistant => turns.push(Turn::assistant(message.content.clone())),
                // Error notices are never replayed to the model.
                MessageRole::System => {}
            }
        }

        turns.push(Turn::user(user_message));
        turns
    }

    pub fn analysis_prompt(&self, kind: AnalysisKind, extracted_text: &str) -> Vec<Turn> {
        let instruction = match kind {
            AnalysisKind::KeyTerms => {
                "Identify and explain the most important legal terms in this document."
            }
            AnalysisKind::Obligations => {
                "List every obligation and responsibility mentioned in the document."
            }
            AnalysisKind::Risks => {
                "Identify potential risks or points of attention in this document."
            }
            AnalysisKind::Deadlines => "Extract every date, deadline and schedule mentioned.",
            AnalysisKind::Parties => "Identify every party involved and their roles.",
        };

        let excerpt = truncate_chars(extracted_text, self.settings.analysis_text_budget);
        vec![
            Turn::system(format!(
                "You are an expert in legal document analysis. {}",
                instruction
            )),
            Turn::user(format!("Analyze this document:\n\n{}", excerpt)),
        ]
    }
}

/// Hard cutoff at `budget` characters, kept on a char boundary.
fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
