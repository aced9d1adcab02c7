// src/backend/services/proof_service.rs
// Manual proof submission: the learner claims a bank transfer and uploads
// a proof artifact; the row sits Pending until administrative review.
use crate::adapter::notifier;
use crate::error::TuitionError;
use crate::metrics;
use crate::models::common::{Amount, EnrollmentId, PaymentId, Timestamp, UserId};
use crate::models::ledger::{LedgerEntry, PaymentChannel, PaymentStatus};
use crate::models::notification::NotificationKind;
use crate::services::{enrollment_service, plan_service};
use crate::storage;
use crate::utils::{log, rate_limit};

const ALLOWED_PROOF_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "pdf"];

/// The proof reference must point at an allowed artifact type. Size and
/// byte-level checks are the file store's concern; only the reference is
/// kept here.
fn validate_proof_ref(proof_ref: &str) -> Result<(), TuitionError> {
    let allowed = proof_ref
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_PROOF_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if allowed {
        Ok(())
    } else {
        Err(TuitionError::InvalidInput(format!(
            "proof artifact must be one of {:?}",
            ALLOWED_PROOF_EXTENSIONS
        )))
    }
}

/// Validations run before the rate limiter and the limiter before the
/// insert, so a refused submission has no side effects at all.
pub fn submit_proof(
    caller: UserId,
    enrollment_id: EnrollmentId,
    amount: Amount,
    transaction_ref: String,
    reported_paid_at: Timestamp,
    proof_ref: String,
    now: Timestamp,
) -> Result<PaymentId, TuitionError> {
    if amount == 0 {
        return Err(TuitionError::InvalidAmount(String::from(
            "payment amount must be positive",
        )));
    }
    if transaction_ref.trim().is_empty() {
        return Err(TuitionError::InvalidInput(String::from(
            "transaction reference must not be empty",
        )));
    }
    validate_proof_ref(&proof_ref)?;
    enrollment_service::require_owned(enrollment_id, caller)?;
    rate_limit::check_proof_submission(caller, now)?;

    let payment_id = storage::cursor::next_id()?;
    let currency = storage::config::get_settings().currency;
    storage::ledger::insert_entry(LedgerEntry {
        payment_id,
        user_id: caller,
        enrollment_id: Some(enrollment_id),
        plan_id: storage::plans::plan_for_enrollment(enrollment_id),
        registration_fee: false,
        amount,
        currency,
        status: PaymentStatus::Pending,
        channel: PaymentChannel::ManualProof,
        external_reference: transaction_ref,
        proof_ref: Some(proof_ref),
        reported_paid_at: Some(reported_paid_at),
        created_at: now,
        confirmed_at: None,
    });
    metrics::record_payment_inserted(PaymentStatus::Pending);
    log::info(format!(
        "Manual proof {} submitted for enrollment {} ({})",
        payment_id, enrollment_id, amount
    ));
    Ok(payment_id)
}

/// Administrative review of a pending manual-proof row. Approval and the
/// balance recompute run in the same message (one atomic unit), so no
/// reader observes a Completed row not yet reflected in the plan.
pub fn review_manual_payment(
    payment_id: PaymentId,
    approve: bool,
    now: Timestamp,
) -> Result<LedgerEntry, TuitionError> {
    let to = if approve {
        PaymentStatus::Completed
    } else {
        PaymentStatus::Failed
    };
    let entry = storage::ledger::update_status(payment_id, PaymentStatus::Pending, to, now)?;
    if approve {
        plan_service::recompute_linked(entry.plan_id, entry.enrollment_id)?;
    }
    metrics::record_payment_finalized(to);
    let kind = if approve {
        NotificationKind::PaymentConfirmed {
            payment_id,
            amount: entry.amount,
        }
    } else {
        NotificationKind::PaymentRejected { payment_id }
    };
    notifier::notify(entry.user_id, kind, now);
    Ok(entry)
}

/// Marks a pending row refunded (e.g. a duplicate transfer returned to
/// the payer). Terminal rows refuse with `InvalidState`.
pub fn mark_refunded(payment_id: PaymentId, now: Timestamp) -> Result<LedgerEntry, TuitionError> {
    let entry = storage::ledger::update_status(
        payment_id,
        PaymentStatus::Pending,
        PaymentStatus::Refunded,
        now,
    )?;
    metrics::record_payment_finalized(PaymentStatus::Refunded);
    Ok(entry)
}
