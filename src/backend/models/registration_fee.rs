// src/backend/models/registration_fee.rs
use crate::models::common::{Amount, FeeId, Timestamp, UserId};
use candid::CandidType;
use serde::{Deserialize, Serialize};

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy)]
pub enum RegistrationFeeStatus {
    Pending,  // Submitted, awaiting administrative review
    Paid,     // Confirmed; the enrollment gate is satisfied
    Rejected, // Review failed; the learner may resubmit
}

/// One-time, course-independent fee gating enrollment creation. One record
/// is effectively active per user: a `Pending` submission may be corrected
/// in place, a `Rejected` one is replaced by resubmission, and a `Paid`
/// record blocks further submissions.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct RegistrationFee {
    pub fee_id: FeeId,
    pub user_id: UserId,
    pub amount: Amount,
    pub bank_reference: String,
    pub status: RegistrationFeeStatus,
    pub deposit_date: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
