// src/backend/utils/rate_limit.rs
use crate::error::TuitionError;
use crate::models::common::{Timestamp, NANOS_PER_SEC};
use candid::Principal;
use std::cell::RefCell;
use std::collections::HashMap;

// --- General endpoint guard: token bucket per caller ---
const GUARD_BUCKET_CAPACITY: u32 = 20; // Burst capacity
const GUARD_REFILL_RATE_PER_SEC: f64 = 1.0;

struct TokenBucket {
    tokens: f64,
    last_refill_ns: Timestamp,
}

impl TokenBucket {
    fn new(now: Timestamp) -> Self {
        TokenBucket {
            tokens: GUARD_BUCKET_CAPACITY as f64,
            last_refill_ns: now,
        }
    }

    fn refill(&mut self, now: Timestamp) {
        let elapsed_secs =
            now.saturating_sub(self.last_refill_ns) as f64 / NANOS_PER_SEC as f64;
        self.tokens =
            (self.tokens + elapsed_secs * GUARD_REFILL_RATE_PER_SEC).min(GUARD_BUCKET_CAPACITY as f64);
        self.last_refill_ns = now;
    }

    fn take(&mut self, now: Timestamp) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

// --- Manual-proof submission limit: fixed window per user ---
pub const PROOF_SUBMISSION_LIMIT: u32 = 5;
pub const PROOF_SUBMISSION_WINDOW_NS: u64 = 5 * 60 * NANOS_PER_SEC;

struct SubmissionWindow {
    window_start: Timestamp,
    count: u32,
}

thread_local! {
    // In-memory maps, cleared on upgrade. The limiter is allowed to be
    // approximate; the ledger itself stays exact.
    static CALLER_BUCKETS: RefCell<HashMap<Principal, TokenBucket>> = RefCell::new(HashMap::new());
    static SUBMISSION_WINDOWS: RefCell<HashMap<Principal, SubmissionWindow>> = RefCell::new(HashMap::new());
}

/// Candid guard for learner-facing update calls.
pub fn rate_guard() -> Result<(), String> {
    let caller = ic_cdk::caller();
    let now = ic_cdk::api::time();
    take_token(caller, now).map_err(|e| e.to_string())
}

pub fn take_token(caller: Principal, now: Timestamp) -> Result<(), TuitionError> {
    CALLER_BUCKETS.with(|buckets| {
        let mut buckets = buckets.borrow_mut();
        let bucket = buckets.entry(caller).or_insert_with(|| TokenBucket::new(now));
        if bucket.take(now) {
            Ok(())
        } else {
            Err(TuitionError::RateLimited(format!(
                "too many requests from {}",
                caller
            )))
        }
    })
}

/// Counts a manual-proof submission against the user's current window.
/// Fails with `RateLimited` (and counts nothing) once the window is full,
/// so a rejected submission inserts no ledger row.
pub fn check_proof_submission(user: Principal, now: Timestamp) -> Result<(), TuitionError> {
    SUBMISSION_WINDOWS.with(|windows| {
        let mut windows = windows.borrow_mut();
        let window = windows.entry(user).or_insert(SubmissionWindow {
            window_start: now,
            count: 0,
        });
        if now.saturating_sub(window.window_start) >= PROOF_SUBMISSION_WINDOW_NS {
            window.window_start = now;
            window.count = 0;
        }
        if window.count >= PROOF_SUBMISSION_LIMIT {
            return Err(TuitionError::RateLimited(format!(
                "at most {} proof submissions per {} seconds",
                PROOF_SUBMISSION_LIMIT,
                PROOF_SUBMISSION_WINDOW_NS / NANOS_PER_SEC
            )));
        }
        window.count += 1;
        Ok(())
    })
}

/// Drops windows that lapsed, so the map does not grow with one entry per
/// user forever. Called from the maintenance tick.
pub fn prune_submission_windows(now: Timestamp) {
    SUBMISSION_WINDOWS.with(|windows| {
        windows
            .borrow_mut()
            .retain(|_, w| now.saturating_sub(w.window_start) < PROOF_SUBMISSION_WINDOW_NS);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: Timestamp = 1_700_000_000 * NANOS_PER_SEC;

    #[test]
    fn submission_window_enforces_limit() {
        let user = Principal::from_slice(&[1]);
        for _ in 0..PROOF_SUBMISSION_LIMIT {
            check_proof_submission(user, T0).unwrap();
        }
        let err = check_proof_submission(user, T0 + NANOS_PER_SEC).unwrap_err();
        assert!(matches!(err, TuitionError::RateLimited(_)));
    }

    #[test]
    fn submission_window_rolls_over() {
        let user = Principal::from_slice(&[2]);
        for _ in 0..PROOF_SUBMISSION_LIMIT {
            check_proof_submission(user, T0).unwrap();
        }
        // A fresh window opens after the full window duration.
        check_proof_submission(user, T0 + PROOF_SUBMISSION_WINDOW_NS).unwrap();
    }

    #[test]
    fn token_bucket_recovers_over_time() {
        let caller = Principal::from_slice(&[3]);
        for _ in 0..GUARD_BUCKET_CAPACITY {
            take_token(caller, T0).unwrap();
        }
        assert!(take_token(caller, T0).is_err());
        // One token refills per second.
        take_token(caller, T0 + NANOS_PER_SEC).unwrap();
    }
}
