// src/backend/storage/enrollments.rs
use crate::error::TuitionError;
use crate::models::common::{CourseId, EnrollmentId, UserId};
use crate::models::enrollment::Enrollment;
use crate::storage::memory::{get_enrollment_index_memory, get_enrollments_memory, Memory};
use crate::storage::storable::Cbor;
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;

type StorableEnrollment = Cbor<Enrollment>;

thread_local! {
    static ENROLLMENTS: RefCell<StableBTreeMap<EnrollmentId, StorableEnrollment, Memory>> = RefCell::new(
        StableBTreeMap::init(get_enrollments_memory())
    );

    /// Secondary index enforcing one enrollment per (learner, course).
    static ENROLLMENT_INDEX: RefCell<StableBTreeMap<String, EnrollmentId, Memory>> = RefCell::new(
        StableBTreeMap::init(get_enrollment_index_memory())
    );
}

/// Composite index key for the (learner, course) uniqueness constraint.
pub fn enrollment_key(user_id: &UserId, course_id: CourseId) -> String {
    format!("{}/{}", user_id.to_text(), course_id)
}

pub fn insert_enrollment(enrollment: Enrollment) {
    let key = enrollment_key(&enrollment.user_id, enrollment.course_id);
    ENROLLMENT_INDEX.with(|index| {
        index.borrow_mut().insert(key, enrollment.enrollment_id);
    });
    ENROLLMENTS.with(|map| {
        map.borrow_mut().insert(enrollment.enrollment_id, Cbor(enrollment));
    });
}

pub fn get_enrollment(enrollment_id: EnrollmentId) -> Option<Enrollment> {
    ENROLLMENTS.with(|map| map.borrow().get(&enrollment_id).map(|cbor| cbor.0))
}

pub fn find_by_user_course(user_id: &UserId, course_id: CourseId) -> Option<EnrollmentId> {
    let key = enrollment_key(user_id, course_id);
    ENROLLMENT_INDEX.with(|index| index.borrow().get(&key))
}

/// Read-modify-write helper. The closure runs inside one message, so the
/// update is atomic with respect to other calls.
pub fn with_enrollment_mut<F, R>(enrollment_id: EnrollmentId, f: F) -> Result<R, TuitionError>
where
    F: FnOnce(&mut Enrollment) -> Result<R, TuitionError>,
{
    ENROLLMENTS.with(|map| {
        let mut map = map.borrow_mut();
        let mut enrollment = map
            .get(&enrollment_id)
            .map(|cbor| cbor.0)
            .ok_or_else(|| TuitionError::NotFound(format!("enrollment {}", enrollment_id)))?;
        let result = f(&mut enrollment)?;
        map.insert(enrollment_id, Cbor(enrollment));
        Ok(result)
    })
}
