// src/backend/models/common.rs
use candid::{CandidType, Principal};
use serde::{Deserialize, Serialize};

// Learners are identified by their IC principal; the engine's own entities
// use a global u64 sequence (see storage::cursor).
pub type UserId = Principal;
pub type CourseId = u64;
pub type EnrollmentId = u64;
pub type PlanId = u64;
pub type PaymentId = u64;
pub type FeeId = u64;

/// External-facing reference of a bank-transfer session.
pub type SessionReference = String;

/// Monetary amount in minor currency units. Negative amounts are
/// unrepresentable; fraction math goes through u128 intermediates.
pub type Amount = u64;

/// Nanoseconds since epoch (IC time).
pub type Timestamp = u64;

pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Course-progress status of an enrollment. Independent of payment state:
/// payment gates content access, never the enrollment lifecycle itself.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy)]
pub enum EnrollmentStatus {
    Enrolled,
    InProgress,
    Completed,
    Dropped,
    Expired,
}

impl Default for EnrollmentStatus { fn default() -> Self { EnrollmentStatus::Enrolled } }
