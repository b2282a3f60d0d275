//! QR link routes. The scan route is the one public read in the API.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use carelink_core::auth::RouteAccess;
use carelink_core::models::Role;
use carelink_core::qr::{IssuedQrLink, QrManager};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::emergency::EmergencyPayload;
use super::{request_meta, require_auth};
use crate::error::{envelope, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyScanRequest {
    pub access_code: String,
    pub access_reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QrLinkPayload {
    qr_link: IssuedQrLink,
}

#[derive(Debug, Serialize)]
struct MessagePayload {
    message: &'static str,
}

/// POST /api/qr/generate/{patient_id}
pub async fn generate(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    const ACCESS: RouteAccess = RouteAccess::Roles(&[Role::Agent]);
    let ctx = require_auth(&state, &headers, ACCESS)?;

    let db = state.db()?;
    let issued = QrManager::new(&db).issue_link(&patient_id, &ctx.user_id)?;
    Ok((
        StatusCode::CREATED,
        envelope(&QrLinkPayload { qr_link: issued })?,
    ))
}

/// GET /api/qr/scan/{secure_token}
pub async fn scan(
    State(state): State<AppState>,
    Path(secure_token): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    const ACCESS: RouteAccess = RouteAccess::Public;
    let _ = ACCESS;
    let (ip, user_agent) = request_meta(&headers);

    let db = state.db()?;
    let outcome = QrManager::new(&db).scan(&secure_token, user_agent.as_deref(), ip.as_deref())?;
    envelope(&outcome)
}

/// POST /api/qr/emergency/{secure_token}
pub async fn emergency(
    State(state): State<AppState>,
    Path(secure_token): Path<String>,
    headers: HeaderMap,
    Json(req): Json<EmergencyScanRequest>,
) -> Result<Json<Value>, ApiError> {
    const ACCESS: RouteAccess = RouteAccess::Roles(&[Role::Agent]);
    let ctx = require_auth(&state, &headers, ACCESS)?;
    let (ip, user_agent) = request_meta(&headers);

    let db = state.db()?;
    let bundle = QrManager::new(&db).emergency_access(
        &secure_token,
        &ctx.user_id,
        &req.access_code,
        &req.access_reason,
        ip.as_deref(),
        user_agent.as_deref(),
    )?;
    envelope(&EmergencyPayload { emergency: bundle })
}

/// DELETE /api/qr/{qr_link_id}
pub async fn deactivate(
    State(state): State<AppState>,
    Path(qr_link_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    const ACCESS: RouteAccess = RouteAccess::Roles(&[Role::Agent]);
    let ctx = require_auth(&state, &headers, ACCESS)?;

    let db = state.db()?;
    QrManager::new(&db).deactivate(&qr_link_id, &ctx.user_id)?;
    envelope(&MessagePayload {
        message: "QR code deactivated",
    })
}

/// GET /api/qr/patient/{patient_id}
pub async fn list(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    const ACCESS: RouteAccess = RouteAccess::AnyAuthenticated;
    let ctx = require_auth(&state, &headers, ACCESS)?;

    let db = state.db()?;
    let links = QrManager::new(&db).list_for_patient(&patient_id, &ctx.user_id)?;
    envelope(&links)
}
