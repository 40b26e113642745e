use chrono::{DateTime, Utc};

use super::{Plan, SubjectId};

/// The owning user of documents and chat sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub id: SubjectId,
    pub email: String,
    pub plan: Plan,
    pub quota: QuotaState,
}

impl Subject {
    pub fn new(email: String, plan: Plan) -> Self {
        Self {
            id: SubjectId::new(),
            email,
            plan,
            quota: QuotaState::new(Utc::now()),
        }
    }
}

/// Monthly consumption counters. Both counters accumulate within the
/// calendar month of `plan_period_start` and reset when it elapses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaState {
    pub plan_period_start: DateTime<Utc>,
    pub documents_used: u32,
    pub ai_tokens_used: u64,
}

impl QuotaState {
    pub fn new(plan_period_start: DateTime<Utc>) -> Self {
        Self {
            plan_period_start,
            documents_used: 0,
            ai_tokens_used: 0,
        }
    }
}
