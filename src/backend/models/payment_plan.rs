// src/backend/models/payment_plan.rs
use crate::models::common::{Amount, EnrollmentId, PlanId, Timestamp};
use candid::CandidType;
use serde::{Deserialize, Serialize};

/// Per-enrollment aggregate of total fee, paid amount and outstanding
/// balance.
///
/// `total_fee` is a price snapshot taken at enrollment time; later course
/// price changes do not alter it. `total_paid` and `balance` are derived:
/// they are recomputed from the payment ledger after every transition into
/// `Completed` and must never be edited directly.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct PaymentPlan {
    pub plan_id: PlanId,
    pub enrollment_id: EnrollmentId,
    pub total_fee: Amount,
    pub total_paid: Amount,
    pub balance: Amount,
    pub created_at: Timestamp,
}

impl PaymentPlan {
    /// Applies a freshly summed paid total, clamping the balance at zero.
    pub fn apply_paid(&mut self, total_paid: Amount) {
        self.total_paid = total_paid;
        self.balance = self.total_fee.saturating_sub(total_paid);
    }
}
