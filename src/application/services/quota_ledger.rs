use chrono::{DateTime, Datelike, Utc};

use crate::domain::{Limit, Plan, PlanLimitTable, QuotaState};

/// Tracks monthly consumption against plan limits.
///
/// The ledger is pure bookkeeping over a subject's [`QuotaState`]; callers
/// run `reset_if_period_elapsed` before any check and persist the state
/// through [`crate::application::ports::SubjectRepository`]. Every
/// AI-consuming or upload-consuming operation checks before doing the
/// expensive work and records only after it succeeds, except that tokens
/// already spent at the provider are recorded even when a later step fails.
#[derive(Debug, Clone, Copy)]
pub struct QuotaLedger {
    limits: PlanLimitTable,
}

impl QuotaLedger {
    pub fn new(limits: PlanLimitTable) -> Self {
        Self { limits }
    }

    /// Zeroes both counters and advances the period marker when `now`
    /// falls in a different calendar month than the period start.
    /// Returns whether a reset happened; idempotent within one period.
    pub fn reset_if_period_elapsed(&self, state: &mut QuotaState, now: DateTime<Utc>) -> bool {
        let start = state.plan_period_start;
        if start.year() != now.year() || start.month() != now.month() {
            state.documents_used = 0;
            state.ai_tokens_used = 0;
            state.plan_period_start = now;
            true
        } else {
            false
        }
    }

    pub fn can_upload_document(&self, plan: Plan, state: &QuotaState) -> bool {
        match self.limits.limits(plan).documents_per_month {
            Limit::Unlimited => true,
            Limit::Capped(limit) => u64::from(state.documents_used) < limit,
        }
    }

    pub fn can_consume_tokens(&self, plan: Plan, state: &QuotaState, requested: u64) -> bool {
        match self.limits.limits(plan).ai_tokens_per_month {
            Limit::Unlimited => true,
            Limit::Capped(limit) => state.ai_tokens_used + requested <= limit,
        }
    }

    /// Message-count bound, tracked per session rather than per period.
    pub fn can_send_message(&self, plan: Plan, messages_in_session: u64) -> bool {
        match self.limits.limits(plan).chat_messages_per_document {
            Limit::Unlimited => true,
            Limit::Capped(limit) => messages_in_session < limit,
        }
    }

    pub fn record_upload(&self, state: &mut QuotaState) {
        state.documents_used += 1;
    }

    pub fn record_tokens(&self, state: &mut QuotaState, amount: u64) {
        state.ai_tokens_used += amount;
    }
}
