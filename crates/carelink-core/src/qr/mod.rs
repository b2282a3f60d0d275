//! QR link manager: issues, rotates and invalidates per-patient access
//! tokens, and serves the public scan path.

use rand::RngCore;
use serde::Serialize;

use crate::db::Database;
use crate::emergency::{EmergencyBundle, EmergencyService};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    now_rfc3339, ActivityLog, Notification, PatientSummary, QrLink, Role, ANONYMOUS_ACTOR,
};
use crate::notify::NotificationSink;

/// Freshly issued link, including the URL to embed in the QR image.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedQrLink {
    pub id: String,
    pub patient_id: String,
    pub secure_token: String,
    pub expires_at: String,
    pub qr_url: String,
}

/// Reduced patient view returned on scan. No medical history beyond the
/// blood type.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedPatient {
    pub id: String,
    pub patient_id: String,
    pub fullname: String,
    pub email: String,
    pub sex_at_birth: String,
    pub birth_date: String,
    pub blood_type: Option<String>,
    pub created_at: String,
    pub last_scanned: Option<String>,
}

/// Post-increment scan statistics reported back to the scanner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrScanInfo {
    pub id: String,
    pub secure_token: String,
    pub expires_at: String,
    pub scan_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub patient: ScannedPatient,
    pub qr_info: QrScanInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientQrLinks {
    pub patient: PatientSummary,
    pub qr_codes: Vec<QrLink>,
}

/// 256 bits from the OS RNG, hex encoded. Globally unique in practice and
/// backed by the UNIQUE column constraint.
fn generate_secure_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub struct QrManager<'a> {
    db: &'a Database,
}

impl<'a> QrManager<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Issue a fresh link for a patient, deactivating any previous active
    /// link in the same transaction. Only agents may issue.
    pub fn issue_link(&self, patient_id: &str, issuer_id: &str) -> ServiceResult<IssuedQrLink> {
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| ServiceError::NotFound("patient not found".into()))?;

        match self.db.get_user(issuer_id)? {
            Some(user) if user.role == Role::Agent => {}
            _ => {
                return Err(ServiceError::Forbidden(
                    "only health agents can generate QR codes".into(),
                ))
            }
        }

        let link = QrLink::issue(
            patient_id.to_string(),
            generate_secure_token(),
            issuer_id.to_string(),
        );
        self.db.rotate_qr_links(&link)?;

        self.log_activity(ActivityLog::new(
            issuer_id,
            "QR_CODE_GENERATED",
            Some(patient_id.to_string()),
            format!("QR code generated for patient {}", patient.full_name()),
        ));
        tracing::info!(patient_id, issuer_id, "qr link issued");

        Ok(IssuedQrLink {
            qr_url: format!("/patient/scan/{}", link.secure_token),
            id: link.id,
            patient_id: link.patient_id,
            secure_token: link.secure_token,
            expires_at: link.expires_at,
        })
    }

    /// Public scan path. Bumps the counter, audits the scan and notifies the
    /// patient, then returns the reduced view plus post-increment stats.
    pub fn scan(
        &self,
        secure_token: &str,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> ServiceResult<ScanOutcome> {
        let link = match self.db.get_qr_link_by_token(secure_token)? {
            Some(link) if link.is_active => link,
            _ => return Err(ServiceError::NotFound("qr code invalid or expired".into())),
        };
        if link.is_expired() {
            return Err(ServiceError::BadRequest("qr code expired".into()));
        }

        let patient = self
            .db
            .get_patient(&link.patient_id)?
            .ok_or_else(|| ServiceError::NotFound("patient not found".into()))?;
        let owner = self
            .db
            .get_user(&patient.user_id)?
            .ok_or_else(|| ServiceError::NotFound("patient account not found".into()))?;

        let link = self.db.record_qr_scan(&link.id, &now_rfc3339())?;

        self.log_activity(
            ActivityLog::new(
                ANONYMOUS_ACTOR,
                "QR_CODE_SCANNED",
                Some(link.patient_id.clone()),
                format!(
                    "QR code scanned - UserAgent: {}",
                    user_agent.unwrap_or("unknown")
                ),
            )
            .with_request_meta(
                ip_address.map(str::to_string),
                user_agent.map(str::to_string),
            ),
        );

        NotificationSink::new(self.db).deliver(Notification::new(
            owner.id.clone(),
            Role::Patient,
            "qr_scan",
            "Your QR code was scanned.",
            serde_json::json!({
                "secureToken": link.secure_token,
                "userAgent": user_agent,
                "ipAddress": ip_address,
            }),
        ));

        Ok(ScanOutcome {
            patient: ScannedPatient {
                id: owner.id,
                fullname: patient.full_name(),
                patient_id: patient.patient_id,
                email: owner.email,
                sex_at_birth: patient.sex_at_birth,
                birth_date: patient.birth_date,
                blood_type: patient.blood_type,
                created_at: owner.created_at,
                last_scanned: link.last_scanned_at.clone(),
            },
            qr_info: QrScanInfo {
                id: link.id,
                secure_token: link.secure_token,
                expires_at: link.expires_at,
                scan_count: link.scan_count,
            },
        })
    }

    /// Emergency access mediated by a scanned QR token: scan side effects
    /// first, then the full grant workflow against the resolved patient.
    pub fn emergency_access(
        &self,
        secure_token: &str,
        agent_id: &str,
        access_code: &str,
        access_reason: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> ServiceResult<EmergencyBundle> {
        if !crate::emergency::validate_access_code(access_code) {
            return Err(ServiceError::BadRequest(
                "invalid access code (6 digits required)".into(),
            ));
        }

        let scanned = self.scan(secure_token, user_agent, ip_address)?;
        EmergencyService::new(self.db).grant_access(
            &scanned.patient.patient_id,
            agent_id,
            access_code,
            access_reason,
            ip_address,
            user_agent,
        )
    }

    /// Deactivate a link by id. Role is enforced at the guard; ownership is
    /// deliberately not checked here.
    pub fn deactivate(&self, qr_link_id: &str, actor_id: &str) -> ServiceResult<()> {
        let link = self
            .db
            .get_qr_link(qr_link_id)?
            .ok_or_else(|| ServiceError::NotFound("qr code not found".into()))?;

        self.db.deactivate_qr_link(qr_link_id)?;
        self.log_activity(ActivityLog::new(
            actor_id,
            "QR_CODE_DEACTIVATED",
            Some(link.patient_id),
            "QR code deactivated",
        ));
        Ok(())
    }

    /// All links for a patient, newest first. Requester must be an agent or
    /// the patient's own account.
    pub fn list_for_patient(
        &self,
        patient_id: &str,
        requester_id: &str,
    ) -> ServiceResult<PatientQrLinks> {
        let requester = self
            .db
            .get_user(requester_id)?
            .ok_or_else(|| ServiceError::Forbidden("user not found".into()))?;
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| ServiceError::NotFound("patient not found".into()))?;

        let is_agent = requester.role == Role::Agent;
        let is_owner = patient.user_id == requester.id;
        if !is_agent && !is_owner {
            return Err(ServiceError::Forbidden("access not authorized".into()));
        }

        let qr_codes = self.db.list_qr_links_for_patient(patient_id)?;
        Ok(PatientQrLinks {
            patient: patient.summary(),
            qr_codes,
        })
    }

    fn log_activity(&self, log: ActivityLog) {
        if let Err(e) = self.db.insert_activity_log(&log) {
            tracing::warn!(action = %log.action, error = %e, "activity log write failed");
        }
    }
}
