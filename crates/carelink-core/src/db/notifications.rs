//! Notification database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::users::role_from_sql;
use super::{Database, DbError, DbResult};
use crate::models::Notification;

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let raw_data: String = row.get(5)?;
    let data = serde_json::from_str(&raw_data).unwrap_or(serde_json::Value::Null);
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_role: role_from_sql(2, row.get(2)?)?,
        kind: row.get(3)?,
        message: row.get(4)?,
        data,
        is_read: row.get(6)?,
        viewed_at: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const NOTIFICATION_COLUMNS: &str = r#"
    id, user_id, user_role, kind, message, data, is_read, viewed_at, created_at
"#;

impl Database {
    /// Insert a notification.
    pub fn insert_notification(&self, n: &Notification) -> DbResult<()> {
        let data_json = serde_json::to_string(&n.data)?;
        self.conn.execute(
            &format!(
                "INSERT INTO notifications ({NOTIFICATION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                n.id,
                n.user_id,
                n.user_role.as_str(),
                n.kind,
                n.message,
                data_json,
                n.is_read,
                n.viewed_at,
                n.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a notification by id.
    pub fn get_notification(&self, id: &str) -> DbResult<Option<Notification>> {
        self.conn
            .query_row(
                &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"),
                [id],
                notification_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a user's notifications, newest first.
    pub fn list_notifications_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> DbResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#
        ))?;

        let rows = stmt.query_map(params![user_id, limit as i64], notification_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count a user's unread notifications.
    pub fn count_unread_notifications(&self, user_id: &str) -> DbResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
                [user_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    /// Mark one notification read, returning the updated row.
    pub fn mark_notification_viewed(&self, id: &str, viewed_at: &str) -> DbResult<Notification> {
        let rows = self.conn.execute(
            "UPDATE notifications SET is_read = 1, viewed_at = ?2 WHERE id = ?1",
            params![id, viewed_at],
        )?;
        if rows == 0 {
            return Err(DbError::NotFound(format!("notification {id}")));
        }
        self.get_notification(id)?
            .ok_or_else(|| DbError::NotFound(format!("notification {id}")))
    }

    /// Mark all of a user's unread notifications read.
    pub fn mark_all_notifications_read(&self, user_id: &str, viewed_at: &str) -> DbResult<usize> {
        let rows = self.conn.execute(
            "UPDATE notifications SET is_read = 1, viewed_at = ?2 WHERE user_id = ?1 AND is_read = 0",
            params![user_id, viewed_at],
        )?;
        Ok(rows)
    }
}
