mod analysis;
mod chat_message;
mod chat_session;
mod document;
mod document_id;
mod feedback;
mod message_id;
mod message_role;
mod plan;
mod processing_log;
mod session_id;
mod subject;
mod subject_id;

pub use analysis::AnalysisKind;
pub use chat_message::ChatMessage;
pub use chat_session::ChatSession;
pub use document::{ContentType, Document, DocumentStatus};
pub use document_id::DocumentId;
pub use feedback::ChatFeedback;
pub use message_id::MessageId;
pub use message_role::MessageRole;
pub use plan::{Limit, Plan, PlanLimitTable, PlanLimits};
pub use processing_log::{ProcessingLogEntry, ProcessingStep, StepOutcome};
pub use session_id::SessionId;
pub use subject::{QuotaState, Subject};
pub use subject_id::SubjectId;
