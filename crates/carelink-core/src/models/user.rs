//! User and agent account models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of account roles. Wire strings are converted once at the
/// boundary; anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Agent,
    Admin,
}

/// Raised when a wire string names no known role.
#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Role::Patient),
            // "agent_de_sante" and "doctor" are legacy wire values
            "agent" | "agent_de_sante" | "doctor" => Ok(Role::Agent),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A user account. Owns exactly one patient or agent profile, gated by role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    /// Salted sha-256 digest, `salt$hex` format. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
}

impl User {
    pub fn new(email: String, password_hash: String, role: Role) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            password_hash,
            role,
            is_active: true,
            created_at: super::now_rfc3339(),
        }
    }
}

/// Compact user view returned by auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at.clone(),
        }
    }
}

/// A health agent profile, 1:1 with a user of role `agent`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub user_id: String,
    pub license_number: Option<String>,
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub created_at: String,
}

impl Agent {
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            license_number: None,
            specialty: None,
            phone: None,
            department: None,
            created_at: super::now_rfc3339(),
        }
    }
}

/// Compact agent view embedded in emergency bundles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub user_id: String,
    pub license_number: Option<String>,
    pub specialty: Option<String>,
}

impl From<&Agent> for AgentSummary {
    fn from(agent: &Agent) -> Self {
        Self {
            user_id: agent.user_id.clone(),
            license_number: agent.license_number.clone(),
            specialty: agent.specialty.clone(),
        }
    }
}
