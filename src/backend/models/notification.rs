// src/backend/models/notification.rs
use crate::models::common::{Amount, PaymentId, SessionReference, Timestamp, UserId};
use crate::models::transfer_session::TransferStatus;
use candid::CandidType;
use serde::{Deserialize, Serialize};

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    PaymentConfirmed { payment_id: PaymentId, amount: Amount },
    PaymentRejected { payment_id: PaymentId },
    RegistrationFeeReviewed { approved: bool },
    TransferSessionFinalized { reference: SessionReference, status: TransferStatus },
}

/// One queued message for the external mailer. The engine only appends to
/// the outbox; delivery is the mailer's concern.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct Notification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub created_at: Timestamp,
}
