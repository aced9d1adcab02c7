// src/backend/storage/ledger.rs
// The Ledger Store: durable table of payment attempts. Rows are inserted
// and status-updated (forward only), never deleted.
use crate::error::TuitionError;
use crate::models::common::{Amount, EnrollmentId, PaymentId, PlanId, Timestamp, UserId};
use crate::models::ledger::{LedgerEntry, PaymentStatus};
use crate::storage::memory::{get_payments_memory, Memory};
use crate::storage::storable::Cbor;
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;

type StorableLedgerEntry = Cbor<LedgerEntry>;

thread_local! {
    static PAYMENTS: RefCell<StableBTreeMap<PaymentId, StorableLedgerEntry, Memory>> = RefCell::new(
        StableBTreeMap::init(get_payments_memory())
    );
}

pub fn insert_entry(entry: LedgerEntry) -> PaymentId {
    let payment_id = entry.payment_id;
    PAYMENTS.with(|map| {
        map.borrow_mut().insert(payment_id, Cbor(entry));
    });
    payment_id
}

pub fn get_entry(payment_id: PaymentId) -> Option<LedgerEntry> {
    PAYMENTS.with(|map| map.borrow().get(&payment_id).map(|cbor| cbor.0))
}

/// Conditional status transition: applies `from -> to` only if the row is
/// currently in `from`, and only forward out of `Pending`. A losing writer
/// (gateway retry vs. review racing) gets `InvalidState` and the row stays
/// untouched; callers treat that as a benign no-op.
pub fn update_status(
    payment_id: PaymentId,
    from: PaymentStatus,
    to: PaymentStatus,
    now: Timestamp,
) -> Result<LedgerEntry, TuitionError> {
    if from != PaymentStatus::Pending || to == PaymentStatus::Pending {
        return Err(TuitionError::InvalidState(format!(
            "ledger rows only move forward from Pending, not {:?} -> {:?}",
            from, to
        )));
    }
    PAYMENTS.with(|map| {
        let mut map = map.borrow_mut();
        let mut entry = map
            .get(&payment_id)
            .map(|cbor| cbor.0)
            .ok_or_else(|| TuitionError::NotFound(format!("payment {}", payment_id)))?;
        if entry.status != from {
            return Err(TuitionError::InvalidState(format!(
                "payment {} is {:?}, expected {:?}",
                payment_id, entry.status, from
            )));
        }
        entry.status = to;
        if to == PaymentStatus::Completed {
            entry.confirmed_at = Some(now);
        }
        map.insert(payment_id, Cbor(entry.clone()));
        Ok(entry)
    })
}

/// Sum of Completed rows counting toward the plan (linked directly or via
/// its enrollment; registration-fee rows excluded).
pub fn sum_completed_for_plan(plan_id: PlanId, enrollment_id: EnrollmentId) -> Amount {
    PAYMENTS.with(|map| {
        map.borrow()
            .iter()
            .map(|(_, cbor)| cbor.0)
            .filter(|entry| entry.counts_toward(plan_id, enrollment_id))
            .fold(0u64, |acc, entry| acc.saturating_add(entry.amount))
    })
}

/// All rows for one payer, oldest first (ids are monotonic).
pub fn entries_for_user(user_id: &UserId) -> Vec<LedgerEntry> {
    PAYMENTS.with(|map| {
        map.borrow()
            .iter()
            .map(|(_, cbor)| cbor.0)
            .filter(|entry| entry.user_id == *user_id)
            .collect()
    })
}

pub fn entries_for_enrollment(enrollment_id: EnrollmentId) -> Vec<LedgerEntry> {
    PAYMENTS.with(|map| {
        map.borrow()
            .iter()
            .map(|(_, cbor)| cbor.0)
            .filter(|entry| entry.enrollment_id == Some(enrollment_id))
            .collect()
    })
}

/// Paginated admin listing, oldest first.
pub fn list_entries(offset: u64, limit: usize) -> (Vec<LedgerEntry>, u64) {
    PAYMENTS.with(|map| {
        let map = map.borrow();
        let total = map.len();
        let entries = map
            .iter()
            .skip(offset as usize)
            .take(limit)
            .map(|(_, cbor)| cbor.0)
            .collect();
        (entries, total)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ledger::PaymentChannel;
    use candid::Principal;

    fn entry(payment_id: PaymentId, status: PaymentStatus) -> LedgerEntry {
        LedgerEntry {
            payment_id,
            user_id: Principal::from_slice(&[7]),
            enrollment_id: Some(1),
            plan_id: Some(2),
            registration_fee: false,
            amount: 50_000,
            currency: String::from("IDR"),
            status,
            channel: PaymentChannel::ManualProof,
            external_reference: String::from("TRX-001"),
            proof_ref: Some(String::from("uploads/proof-001.jpg")),
            reported_paid_at: None,
            created_at: 1_000,
            confirmed_at: None,
        }
    }

    #[test]
    fn conditional_update_requires_matching_from_status() {
        insert_entry(entry(10, PaymentStatus::Pending));
        update_status(10, PaymentStatus::Pending, PaymentStatus::Completed, 2_000).unwrap();

        // A second finalizer loses the race: the row is already terminal.
        let err = update_status(10, PaymentStatus::Pending, PaymentStatus::Failed, 3_000)
            .unwrap_err();
        assert!(matches!(err, TuitionError::InvalidState(_)));
        assert_eq!(get_entry(10).unwrap().status, PaymentStatus::Completed);
    }

    #[test]
    fn terminal_rows_never_regress() {
        insert_entry(entry(11, PaymentStatus::Pending));
        update_status(11, PaymentStatus::Pending, PaymentStatus::Failed, 2_000).unwrap();

        let err = update_status(11, PaymentStatus::Failed, PaymentStatus::Completed, 3_000)
            .unwrap_err();
        assert!(matches!(err, TuitionError::InvalidState(_)));
        assert_eq!(get_entry(11).unwrap().status, PaymentStatus::Failed);
    }

    #[test]
    fn completion_stamps_confirmed_at() {
        insert_entry(entry(12, PaymentStatus::Pending));
        let updated =
            update_status(12, PaymentStatus::Pending, PaymentStatus::Completed, 9_999).unwrap();
        assert_eq!(updated.confirmed_at, Some(9_999));

        let failed = {
            insert_entry(entry(13, PaymentStatus::Pending));
            update_status(13, PaymentStatus::Pending, PaymentStatus::Failed, 9_999).unwrap()
        };
        assert_eq!(failed.confirmed_at, None);
    }

    #[test]
    fn sum_skips_pending_and_registration_rows() {
        insert_entry(entry(20, PaymentStatus::Pending));
        let mut completed = entry(21, PaymentStatus::Completed);
        completed.amount = 30_000;
        insert_entry(completed);
        let mut reg_fee = entry(22, PaymentStatus::Completed);
        reg_fee.registration_fee = true;
        reg_fee.plan_id = None;
        reg_fee.enrollment_id = None;
        insert_entry(reg_fee);
        // Linked through the enrollment only, no explicit plan id.
        let mut via_enrollment = entry(23, PaymentStatus::Completed);
        via_enrollment.plan_id = None;
        via_enrollment.amount = 20_000;
        insert_entry(via_enrollment);

        assert_eq!(sum_completed_for_plan(2, 1), 50_000);
    }
}
