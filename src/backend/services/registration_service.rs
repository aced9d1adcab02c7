// src/backend/services/registration_service.rs
// Registration fee gate: a one-time, course-independent fee that must be
// Paid before any enrollment may be created (when the gate is enabled).
use crate::adapter::notifier;
use crate::error::TuitionError;
use crate::metrics;
use crate::models::common::{Amount, Timestamp, UserId};
use crate::models::ledger::{LedgerEntry, PaymentChannel, PaymentStatus};
use crate::models::notification::NotificationKind;
use crate::models::registration_fee::{RegistrationFee, RegistrationFeeStatus};
use crate::storage;
use crate::utils::log;

pub fn is_required() -> bool {
    storage::config::get_settings().registration_fee_required
}

pub fn has_paid(user_id: &UserId) -> bool {
    matches!(
        storage::registration_fees::get_fee(user_id).map(|fee| fee.status),
        Some(RegistrationFeeStatus::Paid)
    )
}

pub fn get_fee(user_id: &UserId) -> Option<RegistrationFee> {
    storage::registration_fees::get_fee(user_id)
}

/// Records (or corrects) the learner's fee deposit claim. A `Pending`
/// record is updated in place; a `Rejected` one is replaced by a fresh
/// submission; a `Paid` one refuses with `AlreadyPaid`. Never transitions
/// to `Paid` itself; that is the administrative review's job.
pub fn submit(
    user_id: UserId,
    amount: Amount,
    bank_reference: String,
    deposit_date: Timestamp,
    now: Timestamp,
) -> Result<RegistrationFee, TuitionError> {
    if amount == 0 {
        return Err(TuitionError::InvalidAmount(String::from(
            "registration fee amount must be positive",
        )));
    }
    if bank_reference.trim().is_empty() {
        return Err(TuitionError::InvalidInput(String::from(
            "bank reference must not be empty",
        )));
    }
    let expected = storage::config::get_settings().registration_fee_amount;
    if expected > 0 && amount < expected {
        return Err(TuitionError::InvalidAmount(format!(
            "registration fee is {}, got {}",
            expected, amount
        )));
    }

    match storage::registration_fees::get_fee(&user_id).map(|fee| fee.status) {
        Some(RegistrationFeeStatus::Paid) => Err(TuitionError::AlreadyPaid),
        Some(RegistrationFeeStatus::Pending) => {
            storage::registration_fees::with_fee_mut(&user_id, |fee| {
                fee.amount = amount;
                fee.bank_reference = bank_reference;
                fee.deposit_date = deposit_date;
                fee.updated_at = now;
                Ok(fee.clone())
            })
        }
        Some(RegistrationFeeStatus::Rejected) | None => {
            let fee_id = storage::cursor::next_id()?;
            let fee = RegistrationFee {
                fee_id,
                user_id,
                amount,
                bank_reference,
                status: RegistrationFeeStatus::Pending,
                deposit_date,
                created_at: now,
                updated_at: now,
            };
            storage::registration_fees::put_fee(fee.clone());
            log::info(format!(
                "Registration fee {} submitted by {} ({})",
                fee_id, user_id, amount
            ));
            Ok(fee)
        }
    }
}

/// Administrative review: `Pending -> Paid` (mirrored into the payment
/// ledger) or `Pending -> Rejected`. Reviewing anything else is an illegal
/// transition.
pub fn review(
    user_id: UserId,
    approve: bool,
    now: Timestamp,
) -> Result<RegistrationFee, TuitionError> {
    let fee = storage::registration_fees::with_fee_mut(&user_id, |fee| {
        if fee.status != RegistrationFeeStatus::Pending {
            return Err(TuitionError::InvalidState(format!(
                "registration fee for {} is {:?}, only Pending can be reviewed",
                user_id, fee.status
            )));
        }
        fee.status = if approve {
            RegistrationFeeStatus::Paid
        } else {
            RegistrationFeeStatus::Rejected
        };
        fee.updated_at = now;
        Ok(fee.clone())
    })?;

    if approve {
        let payment_id = storage::cursor::next_id()?;
        let currency = storage::config::get_settings().currency;
        storage::ledger::insert_entry(LedgerEntry {
            payment_id,
            user_id,
            enrollment_id: None,
            plan_id: None,
            registration_fee: true,
            amount: fee.amount,
            currency,
            status: PaymentStatus::Completed,
            channel: PaymentChannel::ManualProof,
            external_reference: fee.bank_reference.clone(),
            proof_ref: None,
            reported_paid_at: Some(fee.deposit_date),
            created_at: now,
            confirmed_at: Some(now),
        });
        metrics::record_payment_inserted(PaymentStatus::Completed);
        metrics::record_registration_fee_paid();
    }
    notifier::notify(
        user_id,
        NotificationKind::RegistrationFeeReviewed { approved: approve },
        now,
    );
    Ok(fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::init::InitArgs;
    use crate::services::enrollment_service;
    use crate::services::testutil::{learner, T0};
    use crate::storage;
    use candid::Principal;

    fn enable_gate() {
        storage::config::init_settings(InitArgs {
            admin: Principal::from_slice(&[0xad]),
            gateway_principal: None,
            gateway_base_url: None,
            registration_fee_required: true,
            registration_fee_amount: 150_000,
            deposit_fraction_bps: None,
            transfer_session_ttl_secs: None,
        });
    }

    #[test]
    fn enrollment_is_gated_until_the_fee_is_paid() {
        enable_gate();
        storage::courses::set_course_price(10, 1_000_00);
        let user = learner(1);

        let err = enrollment_service::create_enrollment(user, 10, T0).unwrap_err();
        assert_eq!(err, TuitionError::RegistrationRequired);

        submit(user, 150_000, String::from("BRI-778"), T0 - 1_000, T0).unwrap();
        // Still pending: the gate stays closed until review.
        let err = enrollment_service::create_enrollment(user, 10, T0).unwrap_err();
        assert_eq!(err, TuitionError::RegistrationRequired);

        review(user, true, T0 + 1).unwrap();
        assert!(has_paid(&user));
        enrollment_service::create_enrollment(user, 10, T0 + 2).unwrap();
    }

    #[test]
    fn pending_submission_is_corrected_in_place() {
        let user = learner(2);
        let first = submit(user, 150_000, String::from("BCA-1"), T0, T0).unwrap();
        let second = submit(user, 175_000, String::from("BCA-2"), T0 + 1, T0 + 2).unwrap();
        assert_eq!(first.fee_id, second.fee_id);
        assert_eq!(second.amount, 175_000);
        assert_eq!(second.bank_reference, "BCA-2");
        assert_eq!(second.status, RegistrationFeeStatus::Pending);
    }

    #[test]
    fn paid_fee_refuses_resubmission() {
        let user = learner(3);
        submit(user, 150_000, String::from("BNI-9"), T0, T0).unwrap();
        review(user, true, T0 + 1).unwrap();

        let err = submit(user, 150_000, String::from("BNI-10"), T0 + 2, T0 + 2).unwrap_err();
        assert_eq!(err, TuitionError::AlreadyPaid);
    }

    #[test]
    fn rejected_fee_can_be_resubmitted_fresh() {
        let user = learner(4);
        let first = submit(user, 150_000, String::from("CIMB-1"), T0, T0).unwrap();
        review(user, false, T0 + 1).unwrap();
        assert!(!has_paid(&user));

        let second = submit(user, 150_000, String::from("CIMB-2"), T0 + 2, T0 + 3).unwrap();
        assert_ne!(first.fee_id, second.fee_id);
        assert_eq!(second.status, RegistrationFeeStatus::Pending);
    }

    #[test]
    fn approval_mirrors_a_completed_ledger_row() {
        let user = learner(5);
        submit(user, 150_000, String::from("BRI-55"), T0, T0).unwrap();
        review(user, true, T0 + 1).unwrap();

        let history = storage::ledger::entries_for_user(&user);
        assert_eq!(history.len(), 1);
        let row = &history[0];
        assert!(row.registration_fee);
        assert_eq!(row.status, PaymentStatus::Completed);
        assert_eq!(row.amount, 150_000);
        assert_eq!(row.plan_id, None);
    }

    #[test]
    fn double_review_is_an_illegal_transition() {
        let user = learner(6);
        submit(user, 150_000, String::from("BRI-66"), T0, T0).unwrap();
        review(user, true, T0 + 1).unwrap();
        let err = review(user, false, T0 + 2).unwrap_err();
        assert!(matches!(err, TuitionError::InvalidState(_)));
        assert!(has_paid(&user));
    }

    #[test]
    fn short_deposits_are_rejected_when_an_amount_is_configured() {
        enable_gate();
        let err = submit(learner(8), 100_000, String::from("BRI-1"), T0, T0).unwrap_err();
        assert!(matches!(err, TuitionError::InvalidAmount(_)));
        assert!(get_fee(&learner(8)).is_none());
    }

    #[test]
    fn validation_rejects_empty_submissions() {
        let user = learner(7);
        assert!(matches!(
            submit(user, 0, String::from("X"), T0, T0).unwrap_err(),
            TuitionError::InvalidAmount(_)
        ));
        assert!(matches!(
            submit(user, 1_000, String::from("   "), T0, T0).unwrap_err(),
            TuitionError::InvalidInput(_)
        ));
        assert!(get_fee(&user).is_none());
    }
}
