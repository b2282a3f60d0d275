//! Access-control guard: per-route role allow-lists over bearer tokens.

use super::token::TokenService;
use crate::error::{ServiceError, ServiceResult};
use crate::models::Role;

/// Declared allow-list for one route. Every route names its access level
/// explicitly; there is no implicit "no annotation means pass" behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// No token required. A present token is ignored.
    Public,
    /// Any valid token, regardless of role.
    AnyAuthenticated,
    /// Valid token with a role from this list.
    Roles(&'static [Role]),
}

/// Authenticated request context attached for downstream handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
fn bearer_token(header: &str) -> ServiceResult<&str> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(ServiceError::Unauthenticated(
            "malformed authorization header".into(),
        )),
    }
}

impl RouteAccess {
    /// Run the guard state machine for one request.
    ///
    /// No token -> `Unauthenticated`; bad signature or expiry ->
    /// `Unauthenticated`; valid token with a role outside the allow-list ->
    /// `Forbidden`; otherwise the caller gets an [`AuthContext`] (`None` for
    /// public routes).
    pub fn authorize(
        &self,
        tokens: &TokenService,
        authorization: Option<&str>,
    ) -> ServiceResult<Option<AuthContext>> {
        let allowed: Option<&[Role]> = match self {
            RouteAccess::Public => return Ok(None),
            RouteAccess::AnyAuthenticated => None,
            RouteAccess::Roles(roles) => Some(roles),
        };

        let header = authorization
            .ok_or_else(|| ServiceError::Unauthenticated("no authorization header".into()))?;
        let claims = tokens.verify(bearer_token(header)?)?;

        if let Some(roles) = allowed {
            if !roles.contains(&claims.role) {
                return Err(ServiceError::Forbidden("insufficient permissions".into()));
            }
        }

        Ok(Some(AuthContext {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }))
    }
}
