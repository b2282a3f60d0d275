//! QR link model: a rotating secure token granting scoped access to a
//! patient's emergency projection.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default link lifetime, one year.
pub const QR_LINK_TTL_DAYS: i64 = 365;

/// A per-patient access link. At most one link per patient is active at any
/// time; issuing a new one deactivates the rest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QrLink {
    pub id: String,
    pub patient_id: String,
    /// 256-bit random token, hex encoded. Unique across the whole system.
    pub secure_token: String,
    pub created_by: String,
    pub is_active: bool,
    pub expires_at: String,
    pub scan_count: i64,
    pub last_scanned_at: Option<String>,
    pub created_at: String,
}

impl QrLink {
    /// Build a fresh active link expiring [`QR_LINK_TTL_DAYS`] out.
    pub fn issue(patient_id: String, secure_token: String, created_by: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            secure_token,
            created_by,
            is_active: true,
            expires_at: (now + Duration::days(QR_LINK_TTL_DAYS)).to_rfc3339(),
            scan_count: 0,
            last_scanned_at: None,
            created_at: now.to_rfc3339(),
        }
    }

    /// True when `expires_at` is in the past. An unparseable timestamp
    /// counts as expired.
    pub fn is_expired(&self) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(exp) => exp < Utc::now(),
            Err(_) => true,
        }
    }
}
