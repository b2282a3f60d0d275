//! Patient record and the critical-info projection exposed during
//! emergency access.

use serde::{Deserialize, Serialize};

/// A patient record. `patient_id` is the public-facing id handed out on QR
/// codes and API paths; `user_id` points at the owning account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub patient_id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub sex_at_birth: String,
    pub phone: Option<String>,
    /// Critical-care fields surfaced during emergency access.
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub chronic_conditions: Option<String>,
    pub current_medications: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub pregnant_current: bool,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl Patient {
    pub fn new(
        user_id: String,
        first_name: String,
        last_name: String,
        birth_date: String,
        sex_at_birth: String,
    ) -> Self {
        let now = super::now_rfc3339();
        Self {
            patient_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            first_name,
            last_name,
            birth_date,
            sex_at_birth,
            phone: None,
            blood_type: None,
            allergies: None,
            chronic_conditions: None,
            current_medications: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            pregnant_current: false,
            height_cm: None,
            weight_kg: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The minimal medical projection exposed during emergency access.
    /// Deliberately excludes consultation and treatment history.
    pub fn critical_info(&self) -> CriticalInfo {
        CriticalInfo {
            blood_type: self.blood_type.clone(),
            allergies: self.allergies.clone(),
            chronic_conditions: self.chronic_conditions.clone(),
            current_medications: self.current_medications.clone(),
            emergency_contact: EmergencyContact {
                name: self.emergency_contact_name.clone(),
                phone: self.emergency_contact_phone.clone(),
            },
            pregnant_current: self.pregnant_current,
            vital_signs: VitalSigns {
                height_cm: self.height_cm,
                weight_kg: self.weight_kg,
            },
        }
    }

    pub fn summary(&self) -> PatientSummary {
        PatientSummary {
            patient_id: self.patient_id.clone(),
            fullname: self.full_name(),
            sex_at_birth: self.sex_at_birth.clone(),
        }
    }
}

/// Emergency contact person.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Height and weight, part of the critical projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

/// Critical-info projection. This is the exact set of fields an emergency
/// responder sees, and the exact snapshot written to the audit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CriticalInfo {
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub chronic_conditions: Option<String>,
    pub current_medications: Option<String>,
    pub emergency_contact: EmergencyContact,
    pub pregnant_current: bool,
    pub vital_signs: VitalSigns,
}

/// Compact patient view for envelopes that must not leak medical fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub patient_id: String,
    pub fullname: String,
    pub sex_at_birth: String,
}
