//! Identity and session management.
//!
//! [`TokenService`] issues and verifies the signed session tokens,
//! [`RouteAccess`] is the per-route guard, and [`AuthService`] covers
//! signup, login and profile lookup.

mod guard;
mod token;

pub use guard::{AuthContext, RouteAccess};
pub use token::{Claims, TokenService, DEV_SECRET, TOKEN_TTL_HOURS};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    ActivityLog, Agent, AgentSummary, Patient, PatientSummary, Role, User, UserSummary,
};

/// Salted sha-256 credential digest, stored as `salt$digest` (both hex).
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    let digest = digest_with_salt(&salt, password);
    format!("{}${}", hex::encode(salt), digest)
}

/// Constant-shape check of a password against a stored `salt$digest`.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    digest_with_salt(&salt, password) == digest
}

fn digest_with_salt(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Signup payload. Name can arrive either split or as one `fullname`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub role: String,
    pub fullname: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub sex_at_birth: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    #[serde(default)]
    pub consent_for_data_processing: bool,
    pub license_number: Option<String>,
    pub specialty: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupOutcome {
    pub user: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeOutcome {
    pub user: User,
    pub patient: Option<Patient>,
    pub agent: Option<Agent>,
}

/// Account management over the identity store.
pub struct AuthService<'a> {
    db: &'a Database,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a Database, tokens: &'a TokenService) -> Self {
        Self { db, tokens }
    }

    /// Register a patient or agent account. User row, role profile and the
    /// registration audit entry are written in one transaction.
    pub fn signup(&self, req: SignupRequest) -> ServiceResult<SignupOutcome> {
        let role: Role = req
            .role
            .parse()
            .map_err(|_| ServiceError::BadRequest("role must be \"patient\" or \"agent\"".into()))?;
        if role == Role::Admin {
            return Err(ServiceError::BadRequest(
                "role must be \"patient\" or \"agent\"".into(),
            ));
        }

        if self.db.get_user_by_email(&req.email)?.is_some() {
            return Err(ServiceError::Conflict("email already registered".into()));
        }

        let (first_name, last_name) = resolve_name(&req)?;
        let user = User::new(req.email.clone(), hash_password(&req.password), role);
        let log = ActivityLog::new(
            user.id.clone(),
            "user_registration",
            None,
            format!("New {role} account created"),
        );

        match role {
            Role::Patient => {
                let sex_at_birth = req.sex_at_birth.ok_or_else(|| {
                    ServiceError::BadRequest("sex at birth is required for patients".into())
                })?;
                let birth_date = req.birth_date.ok_or_else(|| {
                    ServiceError::BadRequest("birth date is required for patients".into())
                })?;
                if !req.consent_for_data_processing {
                    return Err(ServiceError::BadRequest(
                        "consent for data processing is required for patients".into(),
                    ));
                }

                let mut patient = Patient::new(
                    user.id.clone(),
                    first_name,
                    last_name,
                    birth_date,
                    sex_at_birth,
                );
                patient.phone = req.phone;
                patient.emergency_contact_name = req.emergency_contact_name;
                patient.emergency_contact_phone = req.emergency_contact_phone;

                self.db.create_patient_account(&user, &patient, &log)?;
                tracing::info!(user_id = %user.id, "patient account created");

                Ok(SignupOutcome {
                    user: UserSummary::from(&user),
                    patient: Some(patient.summary()),
                    agent: None,
                })
            }
            Role::Agent => {
                let mut agent = Agent::new(user.id.clone());
                agent.license_number = req.license_number;
                agent.specialty = req.specialty;
                agent.phone = req.phone;
                agent.department = req.department;

                self.db.create_agent_account(&user, &agent, &log)?;
                tracing::info!(user_id = %user.id, "agent account created");

                Ok(SignupOutcome {
                    user: UserSummary::from(&user),
                    patient: None,
                    agent: Some(AgentSummary::from(&agent)),
                })
            }
            Role::Admin => unreachable!("rejected above"),
        }
    }

    /// Authenticate and issue a session token. Unknown email, inactive
    /// account and wrong password are indistinguishable to the caller;
    /// failed attempts on existing accounts are audit-logged.
    pub fn login(&self, email: &str, password: &str) -> ServiceResult<LoginOutcome> {
        let user = match self.db.get_user_by_email(email)? {
            Some(user) if user.is_active => user,
            _ => return Err(ServiceError::Unauthenticated("invalid credentials".into())),
        };

        if !verify_password(password, &user.password_hash) {
            self.db.insert_activity_log(&ActivityLog::new(
                user.id.clone(),
                "login_failed",
                None,
                "Invalid password attempt",
            ))?;
            return Err(ServiceError::Unauthenticated("invalid credentials".into()));
        }

        let token = self.tokens.issue(&user)?;
        self.db.insert_activity_log(&ActivityLog::new(
            user.id.clone(),
            "login_success",
            None,
            "User logged in successfully",
        ))?;

        let mut outcome = LoginOutcome {
            token,
            user: UserSummary::from(&user),
            patient: None,
            agent: None,
        };
        match user.role {
            Role::Patient => {
                outcome.patient = self
                    .db
                    .get_patient_by_user_id(&user.id)?
                    .map(|p| p.summary());
            }
            Role::Agent => {
                outcome.agent = self.db.get_agent(&user.id)?.map(|a| AgentSummary::from(&a));
            }
            Role::Admin => {}
        }
        Ok(outcome)
    }

    /// Current user with the attached role profile.
    pub fn me(&self, user_id: &str) -> ServiceResult<MeOutcome> {
        let user = self
            .db
            .get_user(user_id)?
            .ok_or_else(|| ServiceError::NotFound("user not found".into()))?;
        let patient = self.db.get_patient_by_user_id(user_id)?;
        let agent = self.db.get_agent(user_id)?;
        Ok(MeOutcome {
            user,
            patient,
            agent,
        })
    }
}

fn resolve_name(req: &SignupRequest) -> ServiceResult<(String, String)> {
    if let (Some(first), Some(last)) = (&req.first_name, &req.last_name) {
        return Ok((first.clone(), last.clone()));
    }
    if let Some(fullname) = &req.fullname {
        let mut parts = fullname.trim().split_whitespace();
        let first = parts.next().unwrap_or_default().to_string();
        let last = parts.collect::<Vec<_>>().join(" ");
        return Ok((first, last));
    }
    Err(ServiceError::BadRequest(
        "name is required (fullname or firstName/lastName)".into(),
    ))
}
