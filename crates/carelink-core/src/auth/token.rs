//! Session token service. HS256 JWTs carrying user id, email and role.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Role, User};

/// Tokens are valid for 8 hours from issuance. No revocation list: once
/// issued, a token is good for its full lifetime.
pub const TOKEN_TTL_HOURS: i64 = 8;

/// Development fallback. Any non-development deployment must override it via
/// `JWT_SECRET`.
pub const DEV_SECRET: &str = "dev-secret-change-me";

/// Signed token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies session tokens. The secret is injected once at
/// construction and never mutated afterward.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Build from the `JWT_SECRET` environment variable, falling back to the
    /// development secret.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_SECRET.to_string());
        Self::new(&secret)
    }

    /// Issue a token for a user.
    pub fn issue(&self, user: &User) -> ServiceResult<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + TOKEN_TTL_HOURS * 3600,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(format!("token encoding failed: {e}")))
    }

    /// Verify a token. Fails on bad signature, malformed payload or expiry.
    pub fn verify(&self, token: &str) -> ServiceResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ServiceError::Unauthenticated("invalid token".into()))
    }
}
