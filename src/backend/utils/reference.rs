// src/backend/utils/reference.rs
use crate::models::common::{EnrollmentId, Timestamp};
use sha2::{Digest, Sha256};

/// Derives the external-facing reference of a bank-transfer session from
/// the id sequence. Uniqueness comes from the monotonic sequence; the
/// digest keeps references from being trivially enumerable.
pub fn session_reference(sequence: u64, enrollment_id: EnrollmentId, now: Timestamp) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sequence.to_be_bytes());
    hasher.update(enrollment_id.to_be_bytes());
    hasher.update(now.to_be_bytes());
    let digest = hasher.finalize();
    format!("VA-{}", hex::encode(&digest[..8]).to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_differ_per_sequence() {
        let a = session_reference(1, 42, 1_000);
        let b = session_reference(2, 42, 1_000);
        assert_ne!(a, b);
        assert!(a.starts_with("VA-"));
        assert_eq!(a.len(), 3 + 16);
    }
}
