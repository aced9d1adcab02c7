// src/backend/services/mod.rs
pub mod access;
pub mod enrollment_service;
pub mod plan_service;
pub mod proof_service;
pub mod registration_service;
pub mod scheduler;
pub mod transfer_service;

#[cfg(test)]
pub(crate) mod testutil {
    use crate::models::common::{Amount, CourseId, EnrollmentId, PlanId, Timestamp, NANOS_PER_SEC};
    use crate::services::enrollment_service;
    use crate::storage;
    use candid::Principal;

    pub const T0: Timestamp = 1_750_000_000 * NANOS_PER_SEC;

    pub fn learner(tag: u8) -> Principal {
        Principal::from_slice(&[tag])
    }

    /// Prices the course and enrolls the learner. Each test thread gets its
    /// own thread-local store, so tests never see each other's state.
    pub fn seed_enrollment(
        user: Principal,
        course_id: CourseId,
        fee: Amount,
    ) -> (EnrollmentId, PlanId) {
        storage::courses::set_course_price(course_id, fee);
        let enrollment = enrollment_service::create_enrollment(user, course_id, T0).unwrap();
        let plan_id = storage::plans::plan_for_enrollment(enrollment.enrollment_id).unwrap();
        (enrollment.enrollment_id, plan_id)
    }
}
