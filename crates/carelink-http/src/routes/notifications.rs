//! Notification feed routes. All scoped to the authenticated user.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use carelink_core::auth::RouteAccess;
use carelink_core::notify::NotificationSink;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::require_auth;
use crate::error::{envelope, ApiError};
use crate::AppState;

const DEFAULT_FEED_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkedAllPayload {
    marked_all_read: bool,
}

/// GET /api/notifications
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    const ACCESS: RouteAccess = RouteAccess::AnyAuthenticated;
    let ctx = require_auth(&state, &headers, ACCESS)?;

    let db = state.db()?;
    let feed = NotificationSink::new(&db)
        .list_for_user(&ctx.user_id, query.limit.unwrap_or(DEFAULT_FEED_LIMIT))?;
    envelope(&feed)
}

/// PATCH /api/notifications/{id}/view
pub async fn mark_viewed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    const ACCESS: RouteAccess = RouteAccess::AnyAuthenticated;
    let ctx = require_auth(&state, &headers, ACCESS)?;

    let db = state.db()?;
    let notification = NotificationSink::new(&db).mark_viewed(&id, &ctx.user_id)?;
    envelope(&notification)
}

/// PATCH /api/notifications/mark-all-read
pub async fn mark_all_read(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    const ACCESS: RouteAccess = RouteAccess::AnyAuthenticated;
    let ctx = require_auth(&state, &headers, ACCESS)?;

    let db = state.db()?;
    NotificationSink::new(&db).mark_all_read(&ctx.user_id)?;
    envelope(&MarkedAllPayload {
        marked_all_read: true,
    })
}
