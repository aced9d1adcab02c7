// src/backend/storage/cursor.rs
use crate::error::TuitionError;
use crate::storage::memory::{get_id_cursor_memory, Memory};
use ic_stable_structures::StableCell;
use std::cell::RefCell;

thread_local! {
    /// Global id sequence shared by all engine entities (enrollments,
    /// plans, ledger rows, fee records). Monotonic; never reused.
    static ID_SEQUENCE: RefCell<StableCell<u64, Memory>> = RefCell::new(
        StableCell::init(get_id_cursor_memory(), 0)
            .expect("Failed to initialize id sequence cell")
    );
}

/// Allocate the next id. The first id handed out is 1.
pub fn next_id() -> Result<u64, TuitionError> {
    ID_SEQUENCE.with(|cell| {
        let mut cell = cell.borrow_mut();
        let next = cell.get().saturating_add(1);
        cell.set(next)
            .map_err(|e| TuitionError::StorageError(format!("Failed to advance id sequence: {:?}", e)))?;
        Ok(next)
    })
}
