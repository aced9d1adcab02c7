// src/backend/models/enrollment.rs
use crate::models::common::{CourseId, EnrollmentId, EnrollmentStatus, Timestamp, UserId};
use candid::CandidType;
use serde::{Deserialize, Serialize};

/// A learner's registration on one course. Created once per (learner,
/// course); identity fields are immutable after creation.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct Enrollment {
    pub enrollment_id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub status: EnrollmentStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
