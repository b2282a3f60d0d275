//! User, agent and account-creation database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::patients::insert_patient_row;
use super::{audit::insert_activity_log_row, Database, DbResult};
use crate::models::{ActivityLog, Agent, Patient, Role, User};

/// Map a stored role string back into the closed enum.
pub(super) fn role_from_sql(idx: usize, raw: String) -> rusqlite::Result<Role> {
    raw.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        role: role_from_sql(3, row.get(3)?)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn insert_user_row(conn: &Connection, user: &User) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO users (id, email, password_hash, role, is_active, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            user.id,
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.is_active,
            user.created_at,
        ],
    )?;
    Ok(())
}

fn insert_agent_row(conn: &Connection, agent: &Agent) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO agents (user_id, license_number, specialty, phone, department, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            agent.user_id,
            agent.license_number,
            agent.specialty,
            agent.phone,
            agent.department,
            agent.created_at,
        ],
    )?;
    Ok(())
}

impl Database {
    /// Get a user by id.
    pub fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                r#"
                SELECT id, email, password_hash, role, is_active, created_at
                FROM users
                WHERE id = ?
                "#,
                [id],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a user by email.
    pub fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                r#"
                SELECT id, email, password_hash, role, is_active, created_at
                FROM users
                WHERE email = ?
                "#,
                [email],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get an agent profile by owning user id.
    pub fn get_agent(&self, user_id: &str) -> DbResult<Option<Agent>> {
        self.conn
            .query_row(
                r#"
                SELECT user_id, license_number, specialty, phone, department, created_at
                FROM agents
                WHERE user_id = ?
                "#,
                [user_id],
                |row| {
                    Ok(Agent {
                        user_id: row.get(0)?,
                        license_number: row.get(1)?,
                        specialty: row.get(2)?,
                        phone: row.get(3)?,
                        department: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Create a patient account: user row, patient profile and registration
    /// audit entry in one transaction.
    pub fn create_patient_account(
        &self,
        user: &User,
        patient: &Patient,
        log: &ActivityLog,
    ) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_user_row(&tx, user)?;
        insert_patient_row(&tx, patient)?;
        insert_activity_log_row(&tx, log)?;
        tx.commit()?;
        Ok(())
    }

    /// Create an agent account: user row, agent profile and registration
    /// audit entry in one transaction.
    pub fn create_agent_account(
        &self,
        user: &User,
        agent: &Agent,
        log: &ActivityLog,
    ) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_user_row(&tx, user)?;
        insert_agent_row(&tx, agent)?;
        insert_activity_log_row(&tx, log)?;
        tx.commit()?;
        Ok(())
    }
}
