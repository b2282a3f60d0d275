//! Audit trail database operations. Both tables are append-only; the schema
//! triggers reject UPDATE and DELETE.

use rusqlite::{params, Connection, Row};

use super::{Database, DbResult};
use crate::models::{ActivityLog, EmergencyLog};

pub(super) fn insert_activity_log_row(conn: &Connection, log: &ActivityLog) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO activity_logs (
            id, actor_user_id, action, target_patient_id, details,
            ip_address, user_agent, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            log.id,
            log.actor_user_id,
            log.action,
            log.target_patient_id,
            log.details,
            log.ip_address,
            log.user_agent,
            log.created_at,
        ],
    )?;
    Ok(())
}

fn emergency_log_from_row(row: &Row<'_>) -> rusqlite::Result<EmergencyLog> {
    Ok(EmergencyLog {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        agent_id: row.get(2)?,
        access_code: row.get(3)?,
        access_reason: row.get(4)?,
        accessed_data: row.get(5)?,
        ip_address: row.get(6)?,
        user_agent: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl Database {
    /// Append one activity log row.
    pub fn insert_activity_log(&self, log: &ActivityLog) -> DbResult<()> {
        insert_activity_log_row(&self.conn, log)
    }

    /// Append one emergency log row.
    pub fn insert_emergency_log(&self, log: &EmergencyLog) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO emergency_logs (
                id, patient_id, agent_id, access_code, access_reason,
                accessed_data, ip_address, user_agent, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                log.id,
                log.patient_id,
                log.agent_id,
                log.access_code,
                log.access_reason,
                log.accessed_data,
                log.ip_address,
                log.user_agent,
                log.created_at,
            ],
        )?;
        Ok(())
    }

    /// List emergency logs, optionally filtered by patient and/or agent,
    /// newest first, capped at `limit`.
    pub fn list_emergency_logs(
        &self,
        patient_id: Option<&str>,
        agent_id: Option<&str>,
        limit: usize,
    ) -> DbResult<Vec<EmergencyLog>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, agent_id, access_code, access_reason,
                   accessed_data, ip_address, user_agent, created_at
            FROM emergency_logs
            WHERE (?1 IS NULL OR patient_id = ?1)
              AND (?2 IS NULL OR agent_id = ?2)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?3
            "#,
        )?;

        let rows = stmt.query_map(params![patient_id, agent_id, limit as i64], emergency_log_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count activity log rows for an action (test/audit helper).
    pub fn count_activity_logs(&self, action: &str) -> DbResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM activity_logs WHERE action = ?",
                [action],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
