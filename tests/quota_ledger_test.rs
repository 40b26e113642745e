use chrono::{TimeZone, Utc};

use lexchat::application::services::QuotaLedger;
use lexchat::domain::{Limit, Plan, PlanLimitTable, PlanLimits, QuotaState};

fn table(documents: Limit, tokens: Limit, messages: Limit) -> PlanLimitTable {
    PlanLimitTable {
        free: PlanLimits {
            documents_per_month: documents,
            ai_tokens_per_month: tokens,
            chat_messages_per_document: messages,
        },
        premium: PlanLimits {
            documents_per_month: Limit::Unlimited,
            ai_tokens_per_month: Limit::Unlimited,
            chat_messages_per_document: Limit::Unlimited,
        },
    }
}

#[test]
fn given_period_start_in_past_month_when_resetting_then_zeroes_counters_and_advances_marker() {
    let ledger = QuotaLedger::new(PlanLimitTable::default());
    let mut state = QuotaState::new(Utc.with_ymd_and_hms(2026, 7, 15, 12, 0, 0).unwrap());
    state.documents_used = 3;
    state.ai_tokens_used = 40_000;

    let now = Utc.with_ymd_and_hms(2026, 8, 5, 9, 0, 0).unwrap();
    let reset = ledger.reset_if_period_elapsed(&mut state, now);

    assert!(reset);
    assert_eq!(state.documents_used, 0);
    assert_eq!(state.ai_tokens_used, 0);
    assert_eq!(state.plan_period_start, now);
}

#[test]
fn given_period_already_current_when_resetting_then_is_a_no_op() {
    let ledger = QuotaLedger::new(PlanLimitTable::default());
    let mut state = QuotaState::new(Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());
    state.documents_used = 2;
    state.ai_tokens_used = 100;

    let now = Utc.with_ymd_and_hms(2026, 8, 20, 23, 59, 0).unwrap();
    let reset = ledger.reset_if_period_elapsed(&mut state, now);

    assert!(!reset);
    assert_eq!(state.documents_used, 2);
    assert_eq!(state.ai_tokens_used, 100);
    assert_eq!(
        state.plan_period_start,
        Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap()
    );
}

#[test]
fn given_same_month_in_different_year_when_resetting_then_counters_reset() {
    let ledger = QuotaLedger::new(PlanLimitTable::default());
    let mut state = QuotaState::new(Utc.with_ymd_and_hms(2025, 8, 15, 0, 0, 0).unwrap());
    state.ai_tokens_used = 10;

    let now = Utc.with_ymd_and_hms(2026, 8, 15, 0, 0, 0).unwrap();
    assert!(ledger.reset_if_period_elapsed(&mut state, now));
    assert_eq!(state.ai_tokens_used, 0);
}

#[test]
fn given_token_limit_when_requesting_exact_remainder_then_allowed() {
    let ledger = QuotaLedger::new(table(
        Limit::Capped(10),
        Limit::Capped(100),
        Limit::Capped(10),
    ));
    let mut state = QuotaState::new(Utc::now());
    state.ai_tokens_used = 90;

    assert!(ledger.can_consume_tokens(Plan::Free, &state, 10));
    assert!(!ledger.can_consume_tokens(Plan::Free, &state, 11));
}

#[test]
fn given_unlimited_plan_when_checking_then_always_allowed() {
    let ledger = QuotaLedger::new(PlanLimitTable::default());
    let mut state = QuotaState::new(Utc::now());
    state.documents_used = 1_000;
    state.ai_tokens_used = u64::MAX / 2;

    assert!(ledger.can_upload_document(Plan::Premium, &state));
    assert!(ledger.can_consume_tokens(Plan::Premium, &state, 1_000_000));
    assert!(ledger.can_send_message(Plan::Premium, 1_000_000));
}

#[test]
fn given_document_limit_reached_when_checking_upload_then_rejected() {
    let ledger = QuotaLedger::new(table(
        Limit::Capped(3),
        Limit::Unlimited,
        Limit::Unlimited,
    ));
    let mut state = QuotaState::new(Utc::now());
    state.documents_used = 2;
    assert!(ledger.can_upload_document(Plan::Free, &state));

    ledger.record_upload(&mut state);
    assert_eq!(state.documents_used, 3);
    assert!(!ledger.can_upload_document(Plan::Free, &state));
}

#[test]
fn given_message_limit_when_counting_session_messages_then_boundary_is_exclusive() {
    let ledger = QuotaLedger::new(table(
        Limit::Unlimited,
        Limit::Unlimited,
        Limit::Capped(50),
    ));

    assert!(ledger.can_send_message(Plan::Free, 49));
    assert!(!ledger.can_send_message(Plan::Free, 50));
}

#[test]
fn given_recorded_tokens_when_accumulating_then_counter_grows() {
    let ledger = QuotaLedger::new(PlanLimitTable::default());
    let mut state = QuotaState::new(Utc::now());

    ledger.record_tokens(&mut state, 150);
    ledger.record_tokens(&mut state, 42);
    assert_eq!(state.ai_tokens_used, 192);
}
