//! Emergency access workflow: agent-initiated reads of a patient's critical
//! medical information, with a mandatory append-only audit trail.
//!
//! Every successful grant persists a JSON snapshot of exactly what was
//! exposed, so the audit record stays faithful even if the patient record is
//! edited afterward. Failures before the log row leave no trail.

use serde::Serialize;

use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    now_rfc3339, ActivityLog, AgentSummary, CriticalInfo, EmergencyLog, Notification,
    PatientSummary, Role,
};
use crate::notify::NotificationSink;

/// Access codes are exactly six ASCII digits. Placeholder-strength check;
/// codes are not stored hashed or rate limited here.
pub fn validate_access_code(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}

/// Identity slice of the patient included with a grant.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyPatient {
    pub patient_id: String,
    pub fullname: String,
    pub birth_date: String,
    pub sex_at_birth: String,
}

/// Everything a successful grant exposes. Nothing outside the critical
/// projection crosses this boundary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyBundle {
    pub patient: EmergencyPatient,
    pub critical_info: CriticalInfo,
    pub accessed_at: String,
    pub access_reason: String,
    pub agent: AgentSummary,
}

/// Read-only summary for the report endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyReport {
    pub patient: PatientSummary,
    pub critical_info: CriticalInfo,
    pub recent_access: Vec<EmergencyLog>,
    pub generated_at: String,
}

pub const DEFAULT_LOG_LIMIT: usize = 50;
const REPORT_LOG_ENTRIES: usize = 5;

pub struct EmergencyService<'a> {
    db: &'a Database,
}

impl<'a> EmergencyService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Grant emergency access to a patient's critical information.
    ///
    /// Order matters: code check, agent check, patient lookup, then the
    /// emergency log row. The activity log and patient notification after it
    /// are best-effort and never abort the grant.
    pub fn grant_access(
        &self,
        patient_id: &str,
        agent_id: &str,
        access_code: &str,
        access_reason: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> ServiceResult<EmergencyBundle> {
        if !validate_access_code(access_code) {
            return Err(ServiceError::BadRequest(
                "invalid access code (6 digits required)".into(),
            ));
        }

        let agent = self
            .db
            .get_agent(agent_id)?
            .ok_or_else(|| ServiceError::BadRequest("unauthorized agent".into()))?;
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| ServiceError::NotFound("patient not found".into()))?;

        let critical_info = patient.critical_info();
        let snapshot = serde_json::to_string(&critical_info)?;

        let log = EmergencyLog::new(patient_id, agent_id, access_code, access_reason, snapshot)
            .with_request_meta(
                ip_address.map(str::to_string),
                user_agent.map(str::to_string),
            );
        self.db.insert_emergency_log(&log)?;

        if let Err(e) = self.db.insert_activity_log(
            &ActivityLog::new(
                agent_id,
                "EMERGENCY_ACCESS_DIRECT",
                Some(patient_id.to_string()),
                format!("Emergency access to patient {}", patient.full_name()),
            )
            .with_request_meta(
                ip_address.map(str::to_string),
                user_agent.map(str::to_string),
            ),
        ) {
            tracing::warn!(patient_id, error = %e, "activity log write failed");
        }

        NotificationSink::new(self.db).deliver(Notification::new(
            patient.user_id.clone(),
            Role::Patient,
            "emergency_access",
            "Your critical medical information was accessed in an emergency.",
            serde_json::json!({
                "agentId": agent_id,
                "accessReason": access_reason,
            }),
        ));

        tracing::info!(patient_id, agent_id, "emergency access granted");

        Ok(EmergencyBundle {
            patient: EmergencyPatient {
                fullname: patient.full_name(),
                patient_id: patient.patient_id,
                birth_date: patient.birth_date,
                sex_at_birth: patient.sex_at_birth,
            },
            critical_info,
            accessed_at: log.created_at,
            access_reason: access_reason.to_string(),
            agent: AgentSummary::from(&agent),
        })
    }

    /// Emergency log entries, newest first, optionally filtered. Role is
    /// enforced at the guard.
    pub fn list_logs(
        &self,
        patient_id: Option<&str>,
        agent_id: Option<&str>,
        limit: Option<usize>,
    ) -> ServiceResult<Vec<EmergencyLog>> {
        Ok(self.db.list_emergency_logs(
            patient_id,
            agent_id,
            limit.unwrap_or(DEFAULT_LOG_LIMIT),
        )?)
    }

    /// Current critical information plus recent access history. Read-only;
    /// writes nothing, not even an activity log row.
    pub fn report(&self, patient_id: &str) -> ServiceResult<EmergencyReport> {
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| ServiceError::NotFound("patient not found".into()))?;
        let recent_access =
            self.db
                .list_emergency_logs(Some(patient_id), None, REPORT_LOG_ENTRIES)?;

        Ok(EmergencyReport {
            critical_info: patient.critical_info(),
            patient: patient.summary(),
            recent_access,
            generated_at: now_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Agent, Patient, User};
    use proptest::prelude::*;

    struct Fixture {
        db: Database,
        patient_id: String,
        patient_user_id: String,
        agent_id: String,
    }

    fn setup() -> Fixture {
        let db = Database::open_in_memory().unwrap();

        let owner = User::new("awa@example.org".into(), "s$h".into(), Role::Patient);
        let mut patient = Patient::new(
            owner.id.clone(),
            "Awa".into(),
            "Diallo".into(),
            "1990-04-02".into(),
            "F".into(),
        );
        patient.blood_type = Some("O+".into());
        patient.allergies = Some("penicillin".into());
        let log = ActivityLog::new(owner.id.clone(), "user_registration", None, "new patient");
        db.create_patient_account(&owner, &patient, &log).unwrap();

        let agent_user = User::new("dr@example.org".into(), "s$h".into(), Role::Agent);
        let mut agent = Agent::new(agent_user.id.clone());
        agent.specialty = Some("cardiology".into());
        let log = ActivityLog::new(agent_user.id.clone(), "user_registration", None, "new agent");
        db.create_agent_account(&agent_user, &agent, &log).unwrap();

        Fixture {
            db,
            patient_id: patient.patient_id,
            patient_user_id: owner.id,
            agent_id: agent_user.id,
        }
    }

    #[test]
    fn test_grant_writes_one_log_and_notifies() {
        let f = setup();
        let svc = EmergencyService::new(&f.db);

        let bundle = svc
            .grant_access(
                &f.patient_id,
                &f.agent_id,
                "123456",
                "chest pain",
                Some("10.0.0.1"),
                Some("curl/8"),
            )
            .unwrap();

        assert_eq!(bundle.patient.fullname, "Awa Diallo");
        assert_eq!(bundle.critical_info.blood_type.as_deref(), Some("O+"));
        assert_eq!(bundle.agent.specialty.as_deref(), Some("cardiology"));
        assert_eq!(bundle.access_reason, "chest pain");

        let logs = svc.list_logs(Some(&f.patient_id), None, None).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].agent_id, f.agent_id);
        assert_eq!(logs[0].access_code, "123456");
        assert_eq!(logs[0].ip_address.as_deref(), Some("10.0.0.1"));

        let feed = NotificationSink::new(&f.db)
            .list_for_user(&f.patient_user_id, 50)
            .unwrap();
        assert_eq!(feed.notifications[0].kind, "emergency_access");
    }

    #[test]
    fn test_snapshot_survives_later_edits() {
        let f = setup();
        let svc = EmergencyService::new(&f.db);

        svc.grant_access(&f.patient_id, &f.agent_id, "123456", "triage", None, None)
            .unwrap();

        let logs = svc.list_logs(Some(&f.patient_id), None, None).unwrap();
        let snapshot: serde_json::Value = serde_json::from_str(&logs[0].accessed_data).unwrap();
        assert_eq!(snapshot["bloodType"], "O+");
        assert_eq!(snapshot["allergies"], "penicillin");
    }

    #[test]
    fn test_bad_code_leaves_no_trail() {
        let f = setup();
        let svc = EmergencyService::new(&f.db);

        for code in ["12345", "1234567", "12a456", "", "      "] {
            assert!(matches!(
                svc.grant_access(&f.patient_id, &f.agent_id, code, "triage", None, None),
                Err(ServiceError::BadRequest(_))
            ));
        }
        assert!(svc.list_logs(None, None, None).unwrap().is_empty());
        assert_eq!(
            f.db.count_activity_logs("EMERGENCY_ACCESS_DIRECT").unwrap(),
            0
        );
    }

    #[test]
    fn test_unknown_agent_rejected_before_logging() {
        let f = setup();
        let svc = EmergencyService::new(&f.db);

        // A patient user id has no agent record
        assert!(matches!(
            svc.grant_access(
                &f.patient_id,
                &f.patient_user_id,
                "123456",
                "triage",
                None,
                None
            ),
            Err(ServiceError::BadRequest(_))
        ));
        assert!(svc.list_logs(None, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_patient() {
        let f = setup();
        let svc = EmergencyService::new(&f.db);
        assert!(matches!(
            svc.grant_access("ghost", &f.agent_id, "123456", "triage", None, None),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_logs_filters_and_limit() {
        let f = setup();
        let svc = EmergencyService::new(&f.db);

        for _ in 0..3 {
            svc.grant_access(&f.patient_id, &f.agent_id, "123456", "triage", None, None)
                .unwrap();
        }

        assert_eq!(svc.list_logs(None, None, None).unwrap().len(), 3);
        assert_eq!(svc.list_logs(None, None, Some(2)).unwrap().len(), 2);
        assert_eq!(
            svc.list_logs(Some(&f.patient_id), Some(&f.agent_id), None)
                .unwrap()
                .len(),
            3
        );
        assert!(svc
            .list_logs(Some("other"), None, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_report_is_read_only() {
        let f = setup();
        let svc = EmergencyService::new(&f.db);

        svc.grant_access(&f.patient_id, &f.agent_id, "123456", "triage", None, None)
            .unwrap();
        let report = svc.report(&f.patient_id).unwrap();

        assert_eq!(report.patient.fullname, "Awa Diallo");
        assert_eq!(report.recent_access.len(), 1);
        // Reporting adds no audit rows
        assert_eq!(svc.list_logs(None, None, None).unwrap().len(), 1);
    }

    proptest! {
        #[test]
        fn prop_valid_codes_are_six_digits(code in "[0-9]{6}") {
            prop_assert!(validate_access_code(&code));
        }

        #[test]
        fn prop_non_six_digit_strings_rejected(code in "\\PC*") {
            let well_formed = code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit());
            prop_assert_eq!(validate_access_code(&code), well_formed);
        }
    }
}
