//! Notification sink: fire-and-forget in-app notices.
//!
//! Other workflows call [`NotificationSink::deliver`] as a side effect;
//! delivery failures are logged and swallowed at this single choke point so
//! the primary operation never fails because a notice could not be written.

use serde::Serialize;

use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{now_rfc3339, Notification};

/// A user's notification feed with the unread badge count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

pub struct NotificationSink<'a> {
    db: &'a Database,
}

impl<'a> NotificationSink<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Unconditional insert.
    pub fn create(&self, notification: Notification) -> ServiceResult<Notification> {
        self.db.insert_notification(&notification)?;
        Ok(notification)
    }

    /// Fire-and-forget delivery. The error channel is the tracing log.
    pub fn deliver(&self, notification: Notification) {
        let kind = notification.kind.clone();
        let user_id = notification.user_id.clone();
        if let Err(e) = self.create(notification) {
            tracing::warn!(%user_id, %kind, error = %e, "notification delivery failed");
        }
    }

    /// A user's notifications, newest first, with the unread count.
    pub fn list_for_user(&self, user_id: &str, limit: usize) -> ServiceResult<NotificationFeed> {
        let notifications = self.db.list_notifications_for_user(user_id, limit)?;
        let unread_count = self.db.count_unread_notifications(user_id)?;
        Ok(NotificationFeed {
            notifications,
            unread_count,
        })
    }

    /// Mark one notification viewed. Forbidden when the caller does not own
    /// it; the row is left untouched in that case.
    pub fn mark_viewed(&self, id: &str, user_id: &str) -> ServiceResult<Notification> {
        let existing = self
            .db
            .get_notification(id)?
            .ok_or_else(|| ServiceError::NotFound("notification not found".into()))?;
        if existing.user_id != user_id {
            return Err(ServiceError::Forbidden("not your notification".into()));
        }
        Ok(self.db.mark_notification_viewed(id, &now_rfc3339())?)
    }

    /// Mark all of the caller's notifications read.
    pub fn mark_all_read(&self, user_id: &str) -> ServiceResult<()> {
        self.db.mark_all_notifications_read(user_id, &now_rfc3339())?;
        Ok(())
    }
}
