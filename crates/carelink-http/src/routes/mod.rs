//! Route handlers, grouped by domain.
//!
//! Each handler names its access level as a `RouteAccess` constant and runs
//! the guard before touching state, so the full route/permission table is
//! readable from these modules alone.

pub mod auth;
pub mod emergency;
pub mod notifications;
pub mod qr;

use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::HeaderMap;
use carelink_core::auth::{AuthContext, RouteAccess};

use crate::error::ApiError;
use crate::AppState;

/// Run the guard for a non-public route and return the caller's context.
fn require_auth(
    state: &AppState,
    headers: &HeaderMap,
    access: RouteAccess,
) -> Result<AuthContext, ApiError> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    access
        .authorize(state.tokens(), authorization)?
        .ok_or_else(|| ApiError::internal("guard returned no context for a protected route"))
}

/// Client address and user agent for audit rows. The address comes from
/// `x-forwarded-for` (first hop) when present.
fn request_meta(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (ip, user_agent)
}
