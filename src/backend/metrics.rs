// src/backend/metrics.rs
use crate::models::common::Timestamp;
use crate::models::ledger::PaymentStatus;
use crate::models::transfer_session::TransferStatus;
use crate::storage::metrics::update_metrics;
use candid::CandidType;
use serde::{Deserialize, Serialize};

/// Operational counters for the admin dashboard. Advisory only: balances
/// and access decisions are always derived from the ledger, never from
/// these.
#[derive(CandidType, Serialize, Deserialize, Clone, Debug, Default)]
pub struct EngineMetrics {
    pub enrollments_total: u64,
    pub plans_total: u64,
    pub payments_pending: u64,
    pub payments_completed: u64,
    pub payments_failed: u64,
    pub payments_refunded: u64,
    pub registration_fees_paid: u64,
    pub transfer_sessions_opened: u64,
    pub transfer_sessions_successful: u64,
    pub transfer_sessions_failed: u64,
    pub transfer_sessions_expired: u64,
    pub transfer_sessions_cancelled: u64,
    pub scheduler_last_run: Option<Timestamp>,
}

pub fn record_enrollment_created() {
    update_metrics(|m| m.enrollments_total = m.enrollments_total.saturating_add(1));
}

pub fn record_plan_created() {
    update_metrics(|m| m.plans_total = m.plans_total.saturating_add(1));
}

pub fn record_payment_inserted(status: PaymentStatus) {
    update_metrics(|m| match status {
        PaymentStatus::Pending => m.payments_pending = m.payments_pending.saturating_add(1),
        PaymentStatus::Completed => m.payments_completed = m.payments_completed.saturating_add(1),
        PaymentStatus::Failed => m.payments_failed = m.payments_failed.saturating_add(1),
        PaymentStatus::Refunded => m.payments_refunded = m.payments_refunded.saturating_add(1),
    });
}

pub fn record_payment_finalized(to: PaymentStatus) {
    update_metrics(|m| {
        m.payments_pending = m.payments_pending.saturating_sub(1);
        match to {
            PaymentStatus::Completed => {
                m.payments_completed = m.payments_completed.saturating_add(1)
            }
            PaymentStatus::Failed => m.payments_failed = m.payments_failed.saturating_add(1),
            PaymentStatus::Refunded => m.payments_refunded = m.payments_refunded.saturating_add(1),
            PaymentStatus::Pending => {}
        }
    });
}

pub fn record_registration_fee_paid() {
    update_metrics(|m| m.registration_fees_paid = m.registration_fees_paid.saturating_add(1));
}

pub fn record_session_opened() {
    update_metrics(|m| {
        m.transfer_sessions_opened = m.transfer_sessions_opened.saturating_add(1)
    });
}

pub fn record_session_finalized(status: TransferStatus) {
    update_metrics(|m| match status {
        TransferStatus::Successful => {
            m.transfer_sessions_successful = m.transfer_sessions_successful.saturating_add(1)
        }
        TransferStatus::Expired => {
            m.transfer_sessions_expired = m.transfer_sessions_expired.saturating_add(1)
        }
        TransferStatus::Cancelled => {
            m.transfer_sessions_cancelled = m.transfer_sessions_cancelled.saturating_add(1)
        }
        TransferStatus::Failed => {
            m.transfer_sessions_failed = m.transfer_sessions_failed.saturating_add(1)
        }
        TransferStatus::Pending => {}
    });
}

pub fn record_scheduler_run(now: Timestamp) {
    update_metrics(|m| m.scheduler_last_run = Some(now));
}
