// src/backend/storage/notifications.rs
use crate::error::TuitionError;
use crate::models::notification::Notification;
use crate::storage::memory::{
    get_notifications_data_memory, get_notifications_index_memory, get_notify_cursor_memory,
    Memory,
};
use crate::storage::storable::Cbor;
use ic_stable_structures::{StableCell, StableLog};
use std::cell::RefCell;

type StorableNotification = Cbor<Notification>;

thread_local! {
    /// Outbox: append-only log of messages for the external mailer.
    static NOTIFICATIONS: RefCell<StableLog<StorableNotification, Memory, Memory>> = RefCell::new(
        StableLog::init(get_notifications_index_memory(), get_notifications_data_memory())
            .expect("Failed to initialize notification outbox")
    );

    /// Index of the first not-yet-drained outbox entry.
    static DRAIN_CURSOR: RefCell<StableCell<u64, Memory>> = RefCell::new(
        StableCell::init(get_notify_cursor_memory(), 0)
            .expect("Failed to initialize notification cursor")
    );
}

pub fn append_notification(notification: Notification) -> Result<u64, TuitionError> {
    NOTIFICATIONS.with(|log| {
        log.borrow_mut()
            .append(&Cbor(notification))
            .map_err(|e| TuitionError::StorageError(format!("Failed to append notification: {:?}", e)))
    })
}

/// Hands the next batch of undelivered notifications to the mailer and
/// advances the drain cursor past them.
pub fn drain_notifications(limit: usize) -> Result<Vec<Notification>, TuitionError> {
    NOTIFICATIONS.with(|log| {
        let log = log.borrow();
        let start = DRAIN_CURSOR.with(|cell| *cell.borrow().get());
        let end = log.len().min(start.saturating_add(limit as u64));
        let mut batch = Vec::with_capacity(end.saturating_sub(start) as usize);
        for index in start..end {
            if let Some(cbor) = log.get(index) {
                batch.push(cbor.0);
            }
        }
        DRAIN_CURSOR.with(|cell| {
            cell.borrow_mut()
                .set(end)
                .map_err(|e| TuitionError::StorageError(format!("Failed to advance notification cursor: {:?}", e)))
        })?;
        Ok(batch)
    })
}

pub fn pending_notification_count() -> u64 {
    let drained = DRAIN_CURSOR.with(|cell| *cell.borrow().get());
    NOTIFICATIONS.with(|log| log.borrow().len().saturating_sub(drained))
}
