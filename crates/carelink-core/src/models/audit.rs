//! Append-only audit trail rows.

use serde::{Deserialize, Serialize};

/// Actor recorded for public (unauthenticated) QR scans.
pub const ANONYMOUS_ACTOR: &str = "anonymous";

/// General-purpose audit row covering every mutating action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: String,
    pub actor_user_id: String,
    pub action: String,
    pub target_patient_id: Option<String>,
    pub details: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

impl ActivityLog {
    pub fn new(
        actor_user_id: impl Into<String>,
        action: impl Into<String>,
        target_patient_id: Option<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            actor_user_id: actor_user_id.into(),
            action: action.into(),
            target_patient_id,
            details: details.into(),
            ip_address: None,
            user_agent: None,
            created_at: super::now_rfc3339(),
        }
    }

    pub fn with_request_meta(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip;
        self.user_agent = user_agent;
        self
    }
}

/// Audit row for one emergency access. Carries a serialized snapshot of the
/// critical projection as it looked at access time, so later audits show
/// exactly what was visible even if the record changes afterward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyLog {
    pub id: String,
    pub patient_id: String,
    /// Agent user id, or [`ANONYMOUS_ACTOR`] for public QR access.
    pub agent_id: String,
    pub access_code: String,
    pub access_reason: String,
    /// JSON snapshot of the critical projection.
    pub accessed_data: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

impl EmergencyLog {
    pub fn new(
        patient_id: impl Into<String>,
        agent_id: impl Into<String>,
        access_code: impl Into<String>,
        access_reason: impl Into<String>,
        accessed_data: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            agent_id: agent_id.into(),
            access_code: access_code.into(),
            access_reason: access_reason.into(),
            accessed_data,
            ip_address: None,
            user_agent: None,
            created_at: super::now_rfc3339(),
        }
    }

    pub fn with_request_meta(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip;
        self.user_agent = user_agent;
        self
    }
}
