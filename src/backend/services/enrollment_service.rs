// src/backend/services/enrollment_service.rs
use crate::error::TuitionError;
use crate::metrics;
use crate::models::common::{CourseId, EnrollmentId, EnrollmentStatus, Timestamp, UserId};
use crate::models::enrollment::Enrollment;
use crate::models::ledger::LedgerEntry;
use crate::services::{plan_service, registration_service};
use crate::storage;
use crate::utils::log;

/// Creates an enrollment and its payment plan in one unit. The plan's fee
/// is snapshotted from the course price table now; repricing the course
/// later does not touch existing plans.
pub fn create_enrollment(
    user_id: UserId,
    course_id: CourseId,
    now: Timestamp,
) -> Result<Enrollment, TuitionError> {
    if registration_service::is_required() && !registration_service::has_paid(&user_id) {
        return Err(TuitionError::RegistrationRequired);
    }
    if storage::enrollments::find_by_user_course(&user_id, course_id).is_some() {
        return Err(TuitionError::InvalidState(format!(
            "{} is already enrolled in course {}",
            user_id, course_id
        )));
    }
    let total_fee = storage::courses::get_course_price(course_id)
        .ok_or_else(|| TuitionError::NotFound(format!("price for course {}", course_id)))?;

    let enrollment_id = storage::cursor::next_id()?;
    let enrollment = Enrollment {
        enrollment_id,
        user_id,
        course_id,
        status: EnrollmentStatus::Enrolled,
        created_at: now,
        updated_at: now,
    };
    storage::enrollments::insert_enrollment(enrollment.clone());
    metrics::record_enrollment_created();
    plan_service::create_plan(enrollment_id, total_fee, now)?;

    log::info(format!(
        "Enrollment {} created: learner {} on course {} (fee {})",
        enrollment_id, user_id, course_id, total_fee
    ));
    Ok(enrollment)
}

/// Course-progress transition. Payment state never blocks this; access to
/// content is gated separately by the access resolver.
pub fn set_enrollment_status(
    enrollment_id: EnrollmentId,
    status: EnrollmentStatus,
    caller: UserId,
    caller_is_admin: bool,
    now: Timestamp,
) -> Result<Enrollment, TuitionError> {
    storage::enrollments::with_enrollment_mut(enrollment_id, |enrollment| {
        if !caller_is_admin && enrollment.user_id != caller {
            return Err(TuitionError::Forbidden(format!(
                "enrollment {} belongs to another learner",
                enrollment_id
            )));
        }
        enrollment.status = status;
        enrollment.updated_at = now;
        Ok(enrollment.clone())
    })
}

/// Loads the enrollment and checks the caller owns it.
pub fn require_owned(
    enrollment_id: EnrollmentId,
    caller: UserId,
) -> Result<Enrollment, TuitionError> {
    let enrollment = storage::enrollments::get_enrollment(enrollment_id)
        .ok_or_else(|| TuitionError::NotFound(format!("enrollment {}", enrollment_id)))?;
    if enrollment.user_id != caller {
        return Err(TuitionError::Forbidden(format!(
            "enrollment {} belongs to another learner",
            enrollment_id
        )));
    }
    Ok(enrollment)
}

/// All ledger rows for one payer, oldest first.
pub fn get_payment_history(user_id: UserId) -> Vec<LedgerEntry> {
    storage::ledger::entries_for_user(&user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil::{learner, T0};
    use crate::storage;

    #[test]
    fn enrollment_snapshots_the_course_price() {
        storage::courses::set_course_price(10, 1_500_00);
        let enrollment = create_enrollment(learner(1), 10, T0).unwrap();

        // Repricing after enrollment must not touch the existing plan.
        storage::courses::set_course_price(10, 9_999_00);
        let plan_id = storage::plans::plan_for_enrollment(enrollment.enrollment_id).unwrap();
        let plan = storage::plans::get_plan(plan_id).unwrap();
        assert_eq!(plan.total_fee, 1_500_00);
        assert_eq!(plan.total_paid, 0);
        assert_eq!(plan.balance, 1_500_00);
    }

    #[test]
    fn duplicate_enrollment_is_refused() {
        storage::courses::set_course_price(10, 1_000_00);
        create_enrollment(learner(1), 10, T0).unwrap();
        let err = create_enrollment(learner(1), 10, T0).unwrap_err();
        assert!(matches!(err, TuitionError::InvalidState(_)));
        // A different learner on the same course is fine.
        create_enrollment(learner(2), 10, T0).unwrap();
    }

    #[test]
    fn unpriced_course_cannot_be_enrolled() {
        let err = create_enrollment(learner(1), 404, T0).unwrap_err();
        assert!(matches!(err, TuitionError::NotFound(_)));
    }

    #[test]
    fn status_changes_are_owner_or_admin_only() {
        storage::courses::set_course_price(10, 1_000_00);
        let enrollment = create_enrollment(learner(1), 10, T0).unwrap();

        let err = set_enrollment_status(
            enrollment.enrollment_id,
            EnrollmentStatus::Dropped,
            learner(2),
            false,
            T0 + 1,
        )
        .unwrap_err();
        assert!(matches!(err, TuitionError::Forbidden(_)));

        let updated = set_enrollment_status(
            enrollment.enrollment_id,
            EnrollmentStatus::InProgress,
            learner(1),
            false,
            T0 + 1,
        )
        .unwrap();
        assert_eq!(updated.status, EnrollmentStatus::InProgress);

        let updated = set_enrollment_status(
            enrollment.enrollment_id,
            EnrollmentStatus::Expired,
            learner(9),
            true,
            T0 + 2,
        )
        .unwrap();
        assert_eq!(updated.status, EnrollmentStatus::Expired);
    }
}
