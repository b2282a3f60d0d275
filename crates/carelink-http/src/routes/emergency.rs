//! Emergency access routes.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use carelink_core::auth::RouteAccess;
use carelink_core::emergency::{EmergencyBundle, EmergencyReport, EmergencyService};
use carelink_core::models::{EmergencyLog, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{request_meta, require_auth};
use crate::error::{envelope, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    pub access_code: String,
    pub access_reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsQuery {
    pub patient_id: Option<String>,
    pub agent_id: Option<String>,
    pub limit: Option<usize>,
}

/// Grant bundles ride under an `emergency` key, as consumed by the frontend.
#[derive(Debug, Serialize)]
pub(super) struct EmergencyPayload {
    pub emergency: EmergencyBundle,
}

#[derive(Debug, Serialize)]
struct ReportPayload {
    report: EmergencyReport,
}

#[derive(Debug, Serialize)]
struct LogsPayload {
    logs: Vec<EmergencyLog>,
    total: usize,
}

/// POST /api/emergency/access/{patient_id}
pub async fn access(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<AccessRequest>,
) -> Result<Json<Value>, ApiError> {
    const ACCESS: RouteAccess = RouteAccess::Roles(&[Role::Agent]);
    let ctx = require_auth(&state, &headers, ACCESS)?;
    let (ip, user_agent) = request_meta(&headers);

    let db = state.db()?;
    let bundle = EmergencyService::new(&db).grant_access(
        &patient_id,
        &ctx.user_id,
        &req.access_code,
        &req.access_reason,
        ip.as_deref(),
        user_agent.as_deref(),
    )?;
    envelope(&EmergencyPayload { emergency: bundle })
}

/// GET /api/emergency/report/{patient_id}
pub async fn report(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    const ACCESS: RouteAccess = RouteAccess::Roles(&[Role::Agent]);
    require_auth(&state, &headers, ACCESS)?;

    let db = state.db()?;
    let report = EmergencyService::new(&db).report(&patient_id)?;
    envelope(&ReportPayload { report })
}

/// GET /api/emergency/logs
pub async fn logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    const ACCESS: RouteAccess = RouteAccess::Roles(&[Role::Admin]);
    require_auth(&state, &headers, ACCESS)?;

    let db = state.db()?;
    let logs = EmergencyService::new(&db).list_logs(
        query.patient_id.as_deref(),
        query.agent_id.as_deref(),
        query.limit,
    )?;
    let total = logs.len();
    envelope(&LogsPayload { logs, total })
}
