// src/backend/services/plan_service.rs
use crate::error::TuitionError;
use crate::metrics;
use crate::models::common::{Amount, EnrollmentId, PlanId, Timestamp};
use crate::models::payment_plan::PaymentPlan;
use crate::services::access;
use crate::storage;
use crate::utils::log;
use candid::CandidType;
use serde::{Deserialize, Serialize};

/// Read projection for the UI layer: everything the balance/lock screen
/// needs, derived live from the plan.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct PlanBalance {
    pub plan_id: PlanId,
    pub enrollment_id: EnrollmentId,
    pub total_fee: Amount,
    pub total_paid: Amount,
    pub balance: Amount,
    pub minimum_deposit: Amount,
    pub access_unlocked: bool,
}

/// Creates the payment plan for an enrollment with the course's price
/// snapshot. One plan per enrollment, ever.
pub fn create_plan(
    enrollment_id: EnrollmentId,
    total_fee: Amount,
    now: Timestamp,
) -> Result<PaymentPlan, TuitionError> {
    storage::enrollments::get_enrollment(enrollment_id)
        .ok_or_else(|| TuitionError::NotFound(format!("enrollment {}", enrollment_id)))?;
    if storage::plans::plan_for_enrollment(enrollment_id).is_some() {
        return Err(TuitionError::DuplicatePlan(format!(
            "enrollment {} already has a payment plan",
            enrollment_id
        )));
    }

    let plan_id = storage::cursor::next_id()?;
    let plan = PaymentPlan {
        plan_id,
        enrollment_id,
        total_fee,
        total_paid: 0,
        balance: total_fee,
        created_at: now,
    };
    storage::plans::insert_plan(plan.clone());
    metrics::record_plan_created();
    log::info(format!(
        "Payment plan {} created for enrollment {} (fee {})",
        plan_id, enrollment_id, total_fee
    ));
    Ok(plan)
}

/// Recomputes `total_paid` as the sum of Completed ledger rows tied to the
/// plan and clamps the balance at zero. Idempotent. Must run in the same
/// message as the ledger write that triggered it, so a reader never sees a
/// Completed row whose effect is missing from the plan.
pub fn recompute_balance(plan_id: PlanId) -> Result<PaymentPlan, TuitionError> {
    storage::plans::with_plan_mut(plan_id, |plan| {
        let total_paid = storage::ledger::sum_completed_for_plan(plan_id, plan.enrollment_id);
        plan.apply_paid(total_paid);
        Ok(plan.clone())
    })
}

/// Recompute the plan a ledger row is linked to, directly or through its
/// enrollment. Registration-fee rows have no linked plan; that is fine.
pub fn recompute_linked(
    plan_id: Option<PlanId>,
    enrollment_id: Option<EnrollmentId>,
) -> Result<(), TuitionError> {
    let linked = plan_id.or_else(|| enrollment_id.and_then(storage::plans::plan_for_enrollment));
    if let Some(plan_id) = linked {
        recompute_balance(plan_id)?;
    }
    Ok(())
}

/// `total_fee * deposit_fraction`, under the institution-wide fraction.
pub fn minimum_deposit(plan_id: PlanId) -> Result<Amount, TuitionError> {
    let plan = storage::plans::get_plan(plan_id)
        .ok_or_else(|| TuitionError::NotFound(format!("payment plan {}", plan_id)))?;
    let bps = storage::config::get_settings().deposit_fraction_bps;
    Ok(access::minimum_deposit(plan.total_fee, bps))
}

pub fn get_plan_balance(enrollment_id: EnrollmentId) -> Result<PlanBalance, TuitionError> {
    let plan_id = storage::plans::plan_for_enrollment(enrollment_id).ok_or_else(|| {
        TuitionError::NotFound(format!("payment plan for enrollment {}", enrollment_id))
    })?;
    let plan = storage::plans::get_plan(plan_id)
        .ok_or_else(|| TuitionError::NotFound(format!("payment plan {}", plan_id)))?;
    let bps = storage::config::get_settings().deposit_fraction_bps;
    Ok(PlanBalance {
        plan_id: plan.plan_id,
        enrollment_id: plan.enrollment_id,
        total_fee: plan.total_fee,
        total_paid: plan.total_paid,
        balance: plan.balance,
        minimum_deposit: access::minimum_deposit(plan.total_fee, bps),
        access_unlocked: access::can_access_content(plan.total_fee, plan.total_paid, bps),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ledger::{LedgerEntry, PaymentChannel, PaymentStatus};
    use crate::services::testutil::{learner, seed_enrollment, T0};
    use crate::storage;

    fn completed_entry(plan_id: PlanId, enrollment_id: EnrollmentId, amount: Amount) -> LedgerEntry {
        let payment_id = storage::cursor::next_id().unwrap();
        LedgerEntry {
            payment_id,
            user_id: learner(1),
            enrollment_id: Some(enrollment_id),
            plan_id: Some(plan_id),
            registration_fee: false,
            amount,
            currency: String::from("IDR"),
            status: PaymentStatus::Completed,
            channel: PaymentChannel::ManualProof,
            external_reference: format!("TRX-{}", payment_id),
            proof_ref: None,
            reported_paid_at: None,
            created_at: T0,
            confirmed_at: Some(T0),
        }
    }

    #[test]
    fn a_second_plan_for_the_same_enrollment_is_refused() {
        let (enrollment_id, _plan_id) = seed_enrollment(learner(1), 10, 1_000_00);
        let err = create_plan(enrollment_id, 500_00, T0).unwrap_err();
        assert!(matches!(err, TuitionError::DuplicatePlan(_)));
    }

    #[test]
    fn recompute_sums_completed_entries_and_clamps_at_zero() {
        let (enrollment_id, plan_id) = seed_enrollment(learner(1), 10, 2_000_00);

        storage::ledger::insert_entry(completed_entry(plan_id, enrollment_id, 300_00));
        storage::ledger::insert_entry(completed_entry(plan_id, enrollment_id, 500_00));
        let plan = recompute_balance(plan_id).unwrap();
        assert_eq!(plan.total_paid, 800_00);
        assert_eq!(plan.balance, 1_200_00);

        storage::ledger::insert_entry(completed_entry(plan_id, enrollment_id, 1_200_00));
        let plan = recompute_balance(plan_id).unwrap();
        assert_eq!(plan.total_paid, 2_000_00);
        assert_eq!(plan.balance, 0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let (enrollment_id, plan_id) = seed_enrollment(learner(1), 10, 1_000_00);
        storage::ledger::insert_entry(completed_entry(plan_id, enrollment_id, 400_00));

        let first = recompute_balance(plan_id).unwrap();
        let second = recompute_balance(plan_id).unwrap();
        assert_eq!(first.total_paid, second.total_paid);
        assert_eq!(first.balance, second.balance);
    }

    #[test]
    fn overpayment_never_drives_the_balance_negative() {
        let (enrollment_id, plan_id) = seed_enrollment(learner(1), 10, 500_00);
        storage::ledger::insert_entry(completed_entry(plan_id, enrollment_id, 800_00));
        let plan = recompute_balance(plan_id).unwrap();
        assert_eq!(plan.total_paid, 800_00);
        assert_eq!(plan.balance, 0);
    }

    #[test]
    fn minimum_deposit_uses_the_configured_fraction() {
        let (_enrollment_id, plan_id) = seed_enrollment(learner(1), 10, 1_000_00);
        assert_eq!(minimum_deposit(plan_id).unwrap(), 300_00);
    }

    #[test]
    fn plan_balance_projection_reflects_access() {
        let (enrollment_id, plan_id) = seed_enrollment(learner(1), 10, 2_000_00);
        storage::ledger::insert_entry(completed_entry(plan_id, enrollment_id, 800_00));
        recompute_balance(plan_id).unwrap();

        let balance = get_plan_balance(enrollment_id).unwrap();
        assert_eq!(balance.total_paid, 800_00);
        assert_eq!(balance.balance, 1_200_00);
        assert_eq!(balance.minimum_deposit, 600_00);
        assert!(balance.access_unlocked);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn balance_stays_within_bounds(
                fee in 0u64..10_000_000,
                amounts in proptest::collection::vec(1u64..1_000_000, 0..8),
            ) {
                // Cases share the thread-local store; a fresh course id per
                // case keeps enrollments from colliding.
                let course_id = storage::cursor::next_id().unwrap() + 1_000_000;
                let (enrollment_id, plan_id) = seed_enrollment(learner(9), course_id, fee);
                let mut paid_sum = 0u64;
                for amount in amounts {
                    storage::ledger::insert_entry(completed_entry(plan_id, enrollment_id, amount));
                    paid_sum += amount;
                }
                let plan = recompute_balance(plan_id).unwrap();
                prop_assert_eq!(plan.total_paid, paid_sum);
                prop_assert!(plan.balance <= plan.total_fee);
                if paid_sum <= fee {
                    prop_assert_eq!(plan.balance, fee - paid_sum);
                } else {
                    prop_assert_eq!(plan.balance, 0);
                }
            }
        }
    }
}
