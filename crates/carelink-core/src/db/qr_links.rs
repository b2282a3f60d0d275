//! QR link database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::QrLink;

fn qr_link_from_row(row: &Row<'_>) -> rusqlite::Result<QrLink> {
    Ok(QrLink {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        secure_token: row.get(2)?,
        created_by: row.get(3)?,
        is_active: row.get(4)?,
        expires_at: row.get(5)?,
        scan_count: row.get(6)?,
        last_scanned_at: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const QR_LINK_COLUMNS: &str = r#"
    id, patient_id, secure_token, created_by, is_active,
    expires_at, scan_count, last_scanned_at, created_at
"#;

impl Database {
    /// Deactivate every active link for the patient and insert the fresh one,
    /// in a single transaction. The partial unique index on
    /// `qr_links(patient_id) WHERE is_active = 1` backs the one-active-link
    /// invariant even outside this path.
    pub fn rotate_qr_links(&self, link: &QrLink) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE qr_links SET is_active = 0 WHERE patient_id = ? AND is_active = 1",
            [&link.patient_id],
        )?;
        tx.execute(
            &format!(
                "INSERT INTO qr_links ({QR_LINK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                link.id,
                link.patient_id,
                link.secure_token,
                link.created_by,
                link.is_active,
                link.expires_at,
                link.scan_count,
                link.last_scanned_at,
                link.created_at,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Get a link by id.
    pub fn get_qr_link(&self, id: &str) -> DbResult<Option<QrLink>> {
        self.conn
            .query_row(
                &format!("SELECT {QR_LINK_COLUMNS} FROM qr_links WHERE id = ?"),
                [id],
                qr_link_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a link by exact secure token.
    pub fn get_qr_link_by_token(&self, secure_token: &str) -> DbResult<Option<QrLink>> {
        self.conn
            .query_row(
                &format!("SELECT {QR_LINK_COLUMNS} FROM qr_links WHERE secure_token = ?"),
                [secure_token],
                qr_link_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Record one scan: bump the counter and stamp `last_scanned_at`, then
    /// return the updated row (read-your-write within the same call).
    pub fn record_qr_scan(&self, id: &str, scanned_at: &str) -> DbResult<QrLink> {
        let rows = self.conn.execute(
            "UPDATE qr_links SET scan_count = scan_count + 1, last_scanned_at = ?2 WHERE id = ?1",
            params![id, scanned_at],
        )?;
        if rows == 0 {
            return Err(DbError::NotFound(format!("qr link {id}")));
        }
        self.get_qr_link(id)?
            .ok_or_else(|| DbError::NotFound(format!("qr link {id}")))
    }

    /// Deactivate a link.
    pub fn deactivate_qr_link(&self, id: &str) -> DbResult<bool> {
        let rows = self
            .conn
            .execute("UPDATE qr_links SET is_active = 0 WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    /// List all links for a patient, newest first.
    pub fn list_qr_links_for_patient(&self, patient_id: &str) -> DbResult<Vec<QrLink>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {QR_LINK_COLUMNS} FROM qr_links WHERE patient_id = ? ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map([patient_id], qr_link_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count currently active links for a patient.
    pub fn count_active_qr_links(&self, patient_id: &str) -> DbResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM qr_links WHERE patient_id = ? AND is_active = 1",
                [patient_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
