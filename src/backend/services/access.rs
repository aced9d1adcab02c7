// src/backend/services/access.rs
// Access resolver: maps (total fee, total paid) to a content-access
// decision. Re-evaluated live on every check; there is no cached flag to
// invalidate, so a freshly confirmed payment unlocks on the next call.
use crate::error::TuitionError;
use crate::models::common::{Amount, EnrollmentId};
use crate::storage;

/// True iff the course is free or the paid total reaches the configured
/// minimum-deposit fraction of the fee. Pure; integer math only, so there
/// is no rounding drift at the boundary.
pub fn can_access_content(
    total_fee: Amount,
    total_paid: Amount,
    deposit_fraction_bps: u16,
) -> bool {
    if total_fee == 0 {
        return true;
    }
    (total_paid as u128) * 10_000 >= (total_fee as u128) * (deposit_fraction_bps as u128)
}

/// Minimum paid amount that unlocks access: `total_fee * fraction`,
/// floored to minor units.
pub fn minimum_deposit(total_fee: Amount, deposit_fraction_bps: u16) -> Amount {
    ((total_fee as u128) * (deposit_fraction_bps as u128) / 10_000) as Amount
}

/// Resolves access for an enrollment against its live plan.
pub fn can_access_enrollment(enrollment_id: EnrollmentId) -> Result<bool, TuitionError> {
    let plan_id = storage::plans::plan_for_enrollment(enrollment_id).ok_or_else(|| {
        TuitionError::NotFound(format!("payment plan for enrollment {}", enrollment_id))
    })?;
    let plan = storage::plans::get_plan(plan_id)
        .ok_or_else(|| TuitionError::NotFound(format!("payment plan {}", plan_id)))?;
    let bps = storage::config::get_settings().deposit_fraction_bps;
    Ok(can_access_content(plan.total_fee, plan.total_paid, bps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::init::DEFAULT_DEPOSIT_FRACTION_BPS;

    #[test]
    fn unlocks_exactly_at_the_deposit_fraction() {
        assert!(can_access_content(1_000_00, 300_00, DEFAULT_DEPOSIT_FRACTION_BPS));
        assert!(!can_access_content(1_000_00, 299_99, DEFAULT_DEPOSIT_FRACTION_BPS));
        assert!(can_access_content(1_000_00, 1_000_00, DEFAULT_DEPOSIT_FRACTION_BPS));
        assert!(!can_access_content(1_000_00, 0, DEFAULT_DEPOSIT_FRACTION_BPS));
    }

    #[test]
    fn free_courses_are_always_accessible() {
        assert!(can_access_content(0, 0, DEFAULT_DEPOSIT_FRACTION_BPS));
    }

    #[test]
    fn minimum_deposit_is_the_fee_fraction() {
        assert_eq!(minimum_deposit(1_000_00, DEFAULT_DEPOSIT_FRACTION_BPS), 300_00);
        assert_eq!(minimum_deposit(2_000_00, DEFAULT_DEPOSIT_FRACTION_BPS), 600_00);
        assert_eq!(minimum_deposit(0, DEFAULT_DEPOSIT_FRACTION_BPS), 0);
    }
}
