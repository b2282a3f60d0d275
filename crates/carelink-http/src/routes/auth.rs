//! Account routes: signup, login, current user.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use carelink_core::auth::{AuthService, RouteAccess, SignupRequest};
use serde::Deserialize;
use serde_json::Value;

use super::require_auth;
use crate::error::{envelope, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    const ACCESS: RouteAccess = RouteAccess::Public;
    let _ = ACCESS;

    let db = state.db()?;
    let outcome = AuthService::new(&db, state.tokens()).signup(req)?;
    Ok((StatusCode::CREATED, envelope(&outcome)?))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    const ACCESS: RouteAccess = RouteAccess::Public;
    let _ = ACCESS;

    let db = state.db()?;
    let outcome = AuthService::new(&db, state.tokens()).login(&req.email, &req.password)?;
    envelope(&outcome)
}

/// GET /api/me
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    const ACCESS: RouteAccess = RouteAccess::AnyAuthenticated;
    let ctx = require_auth(&state, &headers, ACCESS)?;

    let db = state.db()?;
    let outcome = AuthService::new(&db, state.tokens()).me(&ctx.user_id)?;
    envelope(&outcome)
}
