//! In-app notification model.

use serde::{Deserialize, Serialize};

use super::Role;

/// A dashboard notice created as a side effect by other workflows and
/// consumed only by its owning user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub user_role: Role,
    /// Notification kind, e.g. `qr_scan` or `emergency_access`.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    /// Structured payload.
    pub data: serde_json::Value,
    pub is_read: bool,
    pub viewed_at: Option<String>,
    pub created_at: String,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        user_role: Role,
        kind: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            user_role,
            kind: kind.into(),
            message: message.into(),
            data,
            is_read: false,
            viewed_at: None,
            created_at: super::now_rfc3339(),
        }
    }
}
