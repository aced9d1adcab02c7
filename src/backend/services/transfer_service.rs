// src/backend/services/transfer_service.rs
// Bank-transfer session manager. Lifecycle: Pending -> {Successful,
// Failed, Expired, Cancelled}, all terminal. Expiry is evaluated lazily on
// every read/write path; the maintenance sweep only adds liveness for
// sessions nobody polls.
use crate::adapter::gateway_adapter::{self, GatewayPollStatus, VirtualAccount};
use crate::adapter::notifier;
use crate::error::TuitionError;
use crate::metrics;
use crate::models::common::{Amount, EnrollmentId, Timestamp, UserId};
use crate::models::enrollment::Enrollment;
use crate::models::ledger::{LedgerEntry, PaymentChannel, PaymentStatus};
use crate::models::notification::NotificationKind;
use crate::models::transfer_session::{BankTransferSession, TransferStatus};
use crate::services::{enrollment_service, plan_service};
use crate::storage;
use crate::utils::{log, reference};

/// What a conditional session write actually did.
enum Applied {
    AlreadyTerminal,
    Expired,
    Finalized,
}

/// Creates a session: allocates a virtual account at the gateway, then
/// records the Pending session with its TTL.
pub async fn create_session(
    caller: UserId,
    enrollment_id: EnrollmentId,
    amount: Amount,
    now: Timestamp,
) -> Result<BankTransferSession, TuitionError> {
    if amount == 0 {
        return Err(TuitionError::InvalidAmount(String::from(
            "transfer amount must be positive",
        )));
    }
    enrollment_service::require_owned(enrollment_id, caller)?;

    let settings = storage::config::get_settings();
    let sequence = storage::cursor::next_id()?;
    let session_reference = reference::session_reference(sequence, enrollment_id, now);
    let account =
        gateway_adapter::allocate_virtual_account(&session_reference, amount, &settings.currency)
            .await?;
    open_session(
        enrollment_id,
        amount,
        session_reference,
        account,
        now,
        settings.session_ttl_ns(),
    )
}

/// Records a freshly allocated session. Split from `create_session` so the
/// state machine can be exercised without the gateway outcall.
pub fn open_session(
    enrollment_id: EnrollmentId,
    amount: Amount,
    session_reference: String,
    account: VirtualAccount,
    now: Timestamp,
    ttl_ns: u64,
) -> Result<BankTransferSession, TuitionError> {
    let session = BankTransferSession {
        reference: session_reference,
        enrollment_id,
        plan_id: storage::plans::plan_for_enrollment(enrollment_id),
        amount,
        virtual_account_number: account.account_number,
        virtual_account_bank: account.bank_name,
        status: TransferStatus::Pending,
        created_at: now,
        expires_at: now.saturating_add(ttl_ns),
        finalized_at: None,
    };
    storage::sessions::insert_session(session.clone())?;
    metrics::record_session_opened();
    log::info(format!(
        "Transfer session {} opened for enrollment {} ({} due via {} {})",
        session.reference,
        enrollment_id,
        amount,
        session.virtual_account_bank,
        session.virtual_account_number
    ));
    Ok(session)
}

/// Status read. The read path itself lazily expires a lapsed Pending
/// session before returning, so callers always observe the effective
/// state; terminal sessions are returned untouched.
pub fn get_status(
    session_reference: &str,
    now: Timestamp,
) -> Result<BankTransferSession, TuitionError> {
    let (session, transitioned) =
        storage::sessions::with_session_mut(session_reference, |session| {
            if session.is_expired(now) {
                session.status = TransferStatus::Expired;
                session.finalized_at = Some(now);
                Ok((session.clone(), true))
            } else {
                Ok((session.clone(), false))
            }
        })?;
    if transitioned {
        note_expired(&session, now);
    }
    Ok(session)
}

/// Applies the gateway's verdict. Idempotent on terminal sessions: a
/// repeated or contradictory callback returns the current state unchanged.
/// A session past `expires_at` becomes Expired regardless of the reported
/// outcome; a late success can never win.
pub fn report_gateway_result(
    session_reference: &str,
    success: bool,
    now: Timestamp,
) -> Result<BankTransferSession, TuitionError> {
    let current = storage::sessions::get_session(session_reference)
        .ok_or_else(|| TuitionError::NotFound(format!("transfer session {}", session_reference)))?;
    if current.status.is_terminal() {
        return Ok(current);
    }
    // Resolved before any write so a missing enrollment cannot leave a
    // finalized session without its ledger row.
    let enrollment = storage::enrollments::get_enrollment(current.enrollment_id).ok_or_else(|| {
        TuitionError::InternalError(format!(
            "transfer session {} references missing enrollment {}",
            session_reference, current.enrollment_id
        ))
    })?;

    let (session, applied) = storage::sessions::with_session_mut(session_reference, |session| {
        if session.status.is_terminal() {
            return Ok((session.clone(), Applied::AlreadyTerminal));
        }
        if session.is_expired(now) {
            session.status = TransferStatus::Expired;
            session.finalized_at = Some(now);
            return Ok((session.clone(), Applied::Expired));
        }
        session.status = if success {
            TransferStatus::Successful
        } else {
            TransferStatus::Failed
        };
        session.finalized_at = Some(now);
        Ok((session.clone(), Applied::Finalized))
    })?;

    match applied {
        Applied::AlreadyTerminal => Ok(session),
        Applied::Expired => {
            note_expired(&session, now);
            Ok(session)
        }
        Applied::Finalized => {
            if session.status == TransferStatus::Successful {
                settle_successful(&session, &enrollment, now)?;
            } else {
                log::info(format!(
                    "Transfer session {} failed at the gateway",
                    session.reference
                ));
            }
            metrics::record_session_finalized(session.status);
            notifier::notify(
                enrollment.user_id,
                NotificationKind::TransferSessionFinalized {
                    reference: session.reference.clone(),
                    status: session.status,
                },
                now,
            );
            Ok(session)
        }
    }
}

/// Ledger row + plan recompute for a confirmed transfer. Runs in the same
/// message as the session transition: one atomic unit.
fn settle_successful(
    session: &BankTransferSession,
    enrollment: &Enrollment,
    now: Timestamp,
) -> Result<(), TuitionError> {
    let payment_id = storage::cursor::next_id()?;
    let currency = storage::config::get_settings().currency;
    storage::ledger::insert_entry(LedgerEntry {
        payment_id,
        user_id: enrollment.user_id,
        enrollment_id: Some(session.enrollment_id),
        plan_id: session.plan_id,
        registration_fee: false,
        amount: session.amount,
        currency,
        status: PaymentStatus::Completed,
        channel: PaymentChannel::BankTransferVirtualAccount,
        external_reference: session.reference.clone(),
        proof_ref: None,
        reported_paid_at: None,
        created_at: now,
        confirmed_at: Some(now),
    });
    metrics::record_payment_inserted(PaymentStatus::Completed);
    plan_service::recompute_linked(session.plan_id, Some(session.enrollment_id))?;
    log::info(format!(
        "Transfer session {} settled: payment {} of {} credited",
        session.reference, payment_id, session.amount
    ));
    Ok(())
}

/// Learner-initiated cancellation. Only the owner may cancel, and only
/// while the session is still Pending; a lapsed session expires instead.
pub fn cancel(
    session_reference: &str,
    caller: UserId,
    now: Timestamp,
) -> Result<BankTransferSession, TuitionError> {
    let current = storage::sessions::get_session(session_reference)
        .ok_or_else(|| TuitionError::NotFound(format!("transfer session {}", session_reference)))?;
    let enrollment = storage::enrollments::get_enrollment(current.enrollment_id).ok_or_else(|| {
        TuitionError::InternalError(format!(
            "transfer session {} references missing enrollment {}",
            session_reference, current.enrollment_id
        ))
    })?;
    if enrollment.user_id != caller {
        return Err(TuitionError::Forbidden(String::from(
            "only the owning learner may cancel a transfer session",
        )));
    }

    let (session, applied) = storage::sessions::with_session_mut(session_reference, |session| {
        if session.is_expired(now) {
            session.status = TransferStatus::Expired;
            session.finalized_at = Some(now);
            return Ok((session.clone(), Applied::Expired));
        }
        if session.status != TransferStatus::Pending {
            return Err(TuitionError::InvalidState(format!(
                "transfer session {} is {:?}",
                session.reference, session.status
            )));
        }
        session.status = TransferStatus::Cancelled;
        session.finalized_at = Some(now);
        Ok((session.clone(), Applied::Finalized))
    })?;

    match applied {
        Applied::Expired => {
            note_expired(&session, now);
            Err(TuitionError::Expired(format!(
                "transfer session {} lapsed before cancellation",
                session_reference
            )))
        }
        _ => {
            metrics::record_session_finalized(TransferStatus::Cancelled);
            log::info(format!(
                "Transfer session {} cancelled by {}",
                session_reference, caller
            ));
            Ok(session)
        }
    }
}

/// Poll-driven confirmation: asks the gateway for the session's state and
/// feeds a terminal verdict through `report_gateway_result`. Consumers
/// call this on an interval until they observe a terminal state.
pub async fn poll_session(
    session_reference: &str,
    now: Timestamp,
) -> Result<BankTransferSession, TuitionError> {
    let session = get_status(session_reference, now)?;
    if session.status.is_terminal() {
        return Ok(session);
    }
    let verdict = gateway_adapter::poll_status(session_reference).await?;
    // Expiry is judged at apply time: the outcall may have taken long
    // enough for the session to lapse meanwhile.
    let now = crate::utils::time::now_ns();
    match verdict {
        GatewayPollStatus::Pending => get_status(session_reference, now),
        GatewayPollStatus::Success => report_gateway_result(session_reference, true, now),
        GatewayPollStatus::Failed => report_gateway_result(session_reference, false, now),
    }
}

/// Maintenance sweep: expires lapsed sessions nobody polls. State is
/// re-checked under the write lock, so a racing poll cannot double-apply.
pub fn sweep_expired(now: Timestamp) -> u32 {
    let mut count = 0u32;
    for session_reference in storage::sessions::expired_references(now) {
        let swept = storage::sessions::with_session_mut(&session_reference, |session| {
            if session.is_expired(now) {
                session.status = TransferStatus::Expired;
                session.finalized_at = Some(now);
                Ok(Some(session.clone()))
            } else {
                Ok(None)
            }
        });
        match swept {
            Ok(Some(session)) => {
                note_expired(&session, now);
                count += 1;
            }
            Ok(None) => {}
            Err(e) => log::error(format!(
                "Sweep failed for transfer session {}: {}",
                session_reference, e
            )),
        }
    }
    count
}

fn note_expired(session: &BankTransferSession, now: Timestamp) {
    metrics::record_session_finalized(TransferStatus::Expired);
    if let Some(enrollment) = storage::enrollments::get_enrollment(session.enrollment_id) {
        notifier::notify(
            enrollment.user_id,
            NotificationKind::TransferSessionFinalized {
                reference: session.reference.clone(),
                status: TransferStatus::Expired,
            },
            now,
        );
    }
    log::info(format!("Transfer session {} expired", session.reference));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::NANOS_PER_SEC;
    use crate::services::testutil::{learner, seed_enrollment, T0};
    use crate::storage;

    const TTL_NS: u64 = 2 * 60 * 60 * NANOS_PER_SEC; // 2 h
    const HOUR_NS: u64 = 60 * 60 * NANOS_PER_SEC;

    fn account() -> VirtualAccount {
        VirtualAccount {
            account_number: String::from("8808123456789012"),
            bank_name: String::from("BNI"),
        }
    }

    fn open(enrollment_id: EnrollmentId, amount: Amount) -> BankTransferSession {
        let sequence = storage::cursor::next_id().unwrap();
        let session_reference = reference::session_reference(sequence, enrollment_id, T0);
        open_session(enrollment_id, amount, session_reference, account(), T0, TTL_NS).unwrap()
    }

    #[test]
    fn success_before_expiry_settles_the_plan() {
        let user = learner(1);
        let (enrollment_id, plan_id) = seed_enrollment(user, 10, 2_000_00);
        let session = open(enrollment_id, 500_00);

        // Polling at 1 h still shows Pending.
        let polled = get_status(&session.reference, T0 + HOUR_NS).unwrap();
        assert_eq!(polled.status, TransferStatus::Pending);

        // Gateway confirms at 1 h 30 m.
        let settled =
            report_gateway_result(&session.reference, true, T0 + HOUR_NS + HOUR_NS / 2).unwrap();
        assert_eq!(settled.status, TransferStatus::Successful);

        let history = storage::ledger::entries_for_enrollment(enrollment_id);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, PaymentStatus::Completed);
        assert_eq!(history[0].amount, 500_00);
        assert_eq!(history[0].channel, PaymentChannel::BankTransferVirtualAccount);

        let plan = storage::plans::get_plan(plan_id).unwrap();
        assert_eq!(plan.total_paid, 500_00);
        assert_eq!(plan.balance, 1_500_00);
    }

    #[test]
    fn a_session_never_succeeds_after_its_expiry() {
        let user = learner(1);
        let (enrollment_id, plan_id) = seed_enrollment(user, 10, 2_000_00);
        let session = open(enrollment_id, 500_00);

        // One second past expires_at: the success is too late.
        let result =
            report_gateway_result(&session.reference, true, T0 + TTL_NS + NANOS_PER_SEC).unwrap();
        assert_eq!(result.status, TransferStatus::Expired);

        assert!(storage::ledger::entries_for_enrollment(enrollment_id).is_empty());
        let plan = storage::plans::get_plan(plan_id).unwrap();
        assert_eq!(plan.total_paid, 0);
    }

    #[test]
    fn reads_lazily_expire_and_late_reports_are_noops() {
        let user = learner(1);
        let (enrollment_id, _) = seed_enrollment(user, 10, 2_000_00);
        let session = open(enrollment_id, 500_00);

        // No gateway report before the 2 h TTL; a read at 2 h 01 m expires.
        let read = get_status(&session.reference, T0 + TTL_NS + 60 * NANOS_PER_SEC).unwrap();
        assert_eq!(read.status, TransferStatus::Expired);

        // A late success afterwards changes nothing.
        let late =
            report_gateway_result(&session.reference, true, T0 + TTL_NS + 120 * NANOS_PER_SEC)
                .unwrap();
        assert_eq!(late.status, TransferStatus::Expired);
        assert!(storage::ledger::entries_for_enrollment(enrollment_id).is_empty());
    }

    #[test]
    fn gateway_reports_are_idempotent_on_terminal_sessions() {
        let user = learner(1);
        let (enrollment_id, plan_id) = seed_enrollment(user, 10, 2_000_00);
        let session = open(enrollment_id, 500_00);

        report_gateway_result(&session.reference, true, T0 + HOUR_NS).unwrap();
        // A contradictory retry does not flip the state or double-credit.
        let retried = report_gateway_result(&session.reference, false, T0 + HOUR_NS + 1).unwrap();
        assert_eq!(retried.status, TransferStatus::Successful);

        assert_eq!(storage::ledger::entries_for_enrollment(enrollment_id).len(), 1);
        let plan = storage::plans::get_plan(plan_id).unwrap();
        assert_eq!(plan.total_paid, 500_00);
    }

    #[test]
    fn failure_reports_finalize_without_a_ledger_row() {
        let user = learner(1);
        let (enrollment_id, _) = seed_enrollment(user, 10, 2_000_00);
        let session = open(enrollment_id, 500_00);

        let failed = report_gateway_result(&session.reference, false, T0 + HOUR_NS).unwrap();
        assert_eq!(failed.status, TransferStatus::Failed);
        assert!(storage::ledger::entries_for_enrollment(enrollment_id).is_empty());
    }

    #[test]
    fn only_the_owner_may_cancel_and_only_while_pending() {
        let user = learner(1);
        let (enrollment_id, _) = seed_enrollment(user, 10, 2_000_00);
        let session = open(enrollment_id, 500_00);

        let err = cancel(&session.reference, learner(2), T0 + 1).unwrap_err();
        assert!(matches!(err, TuitionError::Forbidden(_)));

        let cancelled = cancel(&session.reference, user, T0 + 2).unwrap();
        assert_eq!(cancelled.status, TransferStatus::Cancelled);

        // Terminal now: both cancel and gateway reports refuse/no-op.
        let err = cancel(&session.reference, user, T0 + 3).unwrap_err();
        assert!(matches!(err, TuitionError::InvalidState(_)));
        let reported = report_gateway_result(&session.reference, true, T0 + 4).unwrap();
        assert_eq!(reported.status, TransferStatus::Cancelled);
    }

    #[test]
    fn cancelling_a_lapsed_session_expires_it() {
        let user = learner(1);
        let (enrollment_id, _) = seed_enrollment(user, 10, 2_000_00);
        let session = open(enrollment_id, 500_00);

        let err = cancel(&session.reference, user, T0 + TTL_NS + 1).unwrap_err();
        assert!(matches!(err, TuitionError::Expired(_)));
        assert_eq!(
            storage::sessions::get_session(&session.reference).unwrap().status,
            TransferStatus::Expired
        );
    }

    #[test]
    fn unknown_references_are_not_found() {
        assert!(matches!(
            get_status("VA-DOESNOTEXIST", T0).unwrap_err(),
            TuitionError::NotFound(_)
        ));
        assert!(matches!(
            report_gateway_result("VA-DOESNOTEXIST", true, T0).unwrap_err(),
            TuitionError::NotFound(_)
        ));
    }

    #[test]
    fn sweep_expires_only_lapsed_sessions() {
        let user = learner(1);
        storage::courses::set_course_price(10, 2_000_00);
        storage::courses::set_course_price(11, 2_000_00);
        let e1 = crate::services::enrollment_service::create_enrollment(user, 10, T0)
            .unwrap()
            .enrollment_id;
        let e2 = crate::services::enrollment_service::create_enrollment(user, 11, T0)
            .unwrap()
            .enrollment_id;
        let lapsed = open(e1, 500_00);
        let fresh = {
            let sequence = storage::cursor::next_id().unwrap();
            let session_reference = reference::session_reference(sequence, e2, T0 + HOUR_NS);
            open_session(e2, 500_00, session_reference, account(), T0 + HOUR_NS, TTL_NS).unwrap()
        };

        let swept = sweep_expired(T0 + TTL_NS + 1);
        assert_eq!(swept, 1);
        assert_eq!(
            storage::sessions::get_session(&lapsed.reference).unwrap().status,
            TransferStatus::Expired
        );
        assert_eq!(
            storage::sessions::get_session(&fresh.reference).unwrap().status,
            TransferStatus::Pending
        );
    }
}
