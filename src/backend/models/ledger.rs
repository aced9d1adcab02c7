// src/backend/models/ledger.rs
use crate::models::common::{Amount, EnrollmentId, PaymentId, PlanId, Timestamp, UserId};
use candid::CandidType;
use serde::{Deserialize, Serialize};

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy)]
pub enum PaymentStatus {
    Pending,   // Recorded, awaiting verification (manual proof) or gateway result
    Completed, // Verified; counts toward the plan's paid total
    Failed,    // Rejected by review or by the gateway
    Refunded,  // Returned to the payer without ever completing
}

impl Default for PaymentStatus { fn default() -> Self { PaymentStatus::Pending } }

impl PaymentStatus {
    /// Terminal rows never change again; only `Pending` rows may move.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// How a payment reached us. New channels add a variant here; the ledger
/// row shape stays the same.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy)]
pub enum PaymentChannel {
    ManualProof,
    BankTransferVirtualAccount,
    Other,
}

/// One recorded payment attempt. Append-only: rows are inserted and
/// status-updated (forward only), never deleted.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct LedgerEntry {
    pub payment_id: PaymentId,
    pub user_id: UserId,
    pub enrollment_id: Option<EnrollmentId>,
    pub plan_id: Option<PlanId>,
    /// One-time registration fee rows are plan-independent and never count
    /// toward a plan's paid total.
    pub registration_fee: bool,
    pub amount: Amount,
    pub currency: String,
    pub status: PaymentStatus,
    pub channel: PaymentChannel,
    /// Bank transaction reference (manual proof) or session reference
    /// (virtual account).
    pub external_reference: String,
    /// Opaque reference into the artifact store for an uploaded proof of
    /// payment. The engine never inspects file bytes.
    pub proof_ref: Option<String>,
    /// When the payer claims the transfer was made (manual proof only).
    pub reported_paid_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub confirmed_at: Option<Timestamp>,
}

impl LedgerEntry {
    /// True when this row contributes to the given plan's paid total:
    /// Completed, not a registration fee, and linked to the plan either
    /// directly or through its enrollment.
    pub fn counts_toward(&self, plan_id: PlanId, enrollment_id: EnrollmentId) -> bool {
        self.status == PaymentStatus::Completed
            && !self.registration_fee
            && (self.plan_id == Some(plan_id)
                || (self.plan_id.is_none() && self.enrollment_id == Some(enrollment_id)))
    }
}
