// src/backend/utils/time.rs
use crate::models::common::Timestamp;

/// Current time as nanoseconds since epoch. Services never call this
/// themselves; the API layer resolves `now` once and passes it down.
#[cfg(target_arch = "wasm32")]
pub fn now_ns() -> Timestamp {
    ic_cdk::api::time()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ns() -> Timestamp {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
