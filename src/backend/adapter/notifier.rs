// src/backend/adapter/notifier.rs
// Notification/email collaborator. The engine only appends events to a
// stable outbox; an external mailer drains it through the admin API.
use crate::models::common::{Timestamp, UserId};
use crate::models::notification::{Notification, NotificationKind};
use crate::storage::notifications::append_notification;
use crate::utils::log;

/// Queues a message for the learner. Delivery failures are the mailer's
/// concern; a full outbox must never fail the payment operation.
pub fn notify(user_id: UserId, kind: NotificationKind, now: Timestamp) {
    let notification = Notification {
        user_id,
        kind,
        created_at: now,
    };
    if let Err(e) = append_notification(notification) {
        log::error(format!("Failed to enqueue notification: {}", e));
    }
}
