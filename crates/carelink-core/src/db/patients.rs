//! Patient database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Patient;

pub(super) fn insert_patient_row(conn: &Connection, patient: &Patient) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO patients (
            patient_id, user_id, first_name, last_name, birth_date, sex_at_birth,
            phone, blood_type, allergies, chronic_conditions, current_medications,
            emergency_contact_name, emergency_contact_phone, pregnant_current,
            height_cm, weight_kg, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        "#,
        params![
            patient.patient_id,
            patient.user_id,
            patient.first_name,
            patient.last_name,
            patient.birth_date,
            patient.sex_at_birth,
            patient.phone,
            patient.blood_type,
            patient.allergies,
            patient.chronic_conditions,
            patient.current_medications,
            patient.emergency_contact_name,
            patient.emergency_contact_phone,
            patient.pregnant_current,
            patient.height_cm,
            patient.weight_kg,
            patient.created_at,
            patient.updated_at,
        ],
    )?;
    Ok(())
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        patient_id: row.get(0)?,
        user_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        birth_date: row.get(4)?,
        sex_at_birth: row.get(5)?,
        phone: row.get(6)?,
        blood_type: row.get(7)?,
        allergies: row.get(8)?,
        chronic_conditions: row.get(9)?,
        current_medications: row.get(10)?,
        emergency_contact_name: row.get(11)?,
        emergency_contact_phone: row.get(12)?,
        pregnant_current: row.get(13)?,
        height_cm: row.get(14)?,
        weight_kg: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

const PATIENT_COLUMNS: &str = r#"
    patient_id, user_id, first_name, last_name, birth_date, sex_at_birth,
    phone, blood_type, allergies, chronic_conditions, current_medications,
    emergency_contact_name, emergency_contact_phone, pregnant_current,
    height_cm, weight_kg, created_at, updated_at
"#;

impl Database {
    /// Get a patient by public patient id.
    pub fn get_patient(&self, patient_id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE patient_id = ?"),
                [patient_id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a patient by owning user id.
    pub fn get_patient_by_user_id(&self, user_id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE user_id = ?"),
                [user_id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }
}
