// src/backend/models/transfer_session.rs
use crate::models::common::{Amount, EnrollmentId, PlanId, SessionReference, Timestamp};
use candid::CandidType;
use serde::{Deserialize, Serialize};

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy)]
pub enum TransferStatus {
    Pending,    // Virtual account issued, waiting for the incoming transfer
    Successful, // Gateway confirmed the transfer before expiry
    Failed,     // Gateway reported failure
    Expired,    // TTL passed while still Pending
    Cancelled,  // Learner withdrew the session while still Pending
}

impl Default for TransferStatus { fn default() -> Self { TransferStatus::Pending } }

impl TransferStatus {
    /// Every state except `Pending` is terminal and immutable.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }
}

/// A virtual-account payment session. The gateway issues a bank account
/// number unique to this session so an incoming transfer can be matched to
/// one learner/course payment.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct BankTransferSession {
    pub reference: SessionReference,
    pub enrollment_id: EnrollmentId,
    pub plan_id: Option<PlanId>,
    pub amount: Amount,
    pub virtual_account_number: String,
    pub virtual_account_bank: String,
    pub status: TransferStatus,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub finalized_at: Option<Timestamp>,
}

impl BankTransferSession {
    /// A session past its TTL that was never finalized. Once this holds, no
    /// write path may move the session to `Successful`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.status == TransferStatus::Pending && now >= self.expires_at
    }
}
