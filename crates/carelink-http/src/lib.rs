//! HTTP JSON surface over the carelink core.
//!
//! Every route declares its [`RouteAccess`] level explicitly and responds
//! with the `{"ok": true, ...}` / `{"ok": false, "error": ...}` envelope.

pub mod error;
pub mod routes;

use std::sync::{Arc, Mutex, MutexGuard};

use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use carelink_core::{Database, TokenService};
use serde_json::json;

use crate::error::ApiError;

/// Shared application state. The database handle is the same
/// `Arc<Mutex<Database>>` wrapper used for every request.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
    tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(db: Database, tokens: TokenService) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            tokens: Arc::new(tokens),
        }
    }

    pub(crate) fn db(&self) -> Result<MutexGuard<'_, Database>, ApiError> {
        self.db
            .lock()
            .map_err(|e| ApiError::internal(format!("state lock poisoned: {e}")))
    }

    pub(crate) fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/signup", post(routes::auth::signup))
        .route("/api/login", post(routes::auth::login))
        .route("/api/me", get(routes::auth::me))
        .route(
            "/api/emergency/access/:patient_id",
            post(routes::emergency::access),
        )
        .route(
            "/api/emergency/report/:patient_id",
            get(routes::emergency::report),
        )
        .route("/api/emergency/logs", get(routes::emergency::logs))
        .route("/api/qr/generate/:patient_id", post(routes::qr::generate))
        .route("/api/qr/scan/:secure_token", get(routes::qr::scan))
        .route(
            "/api/qr/emergency/:secure_token",
            post(routes::qr::emergency),
        )
        .route("/api/qr/:qr_link_id", delete(routes::qr::deactivate))
        .route("/api/qr/patient/:patient_id", get(routes::qr::list))
        .route(
            "/api/notifications",
            get(routes::notifications::list),
        )
        .route(
            "/api/notifications/mark-all-read",
            patch(routes::notifications::mark_all_read),
        )
        .route(
            "/api/notifications/:id/view",
            patch(routes::notifications::mark_viewed),
        )
        .fallback(unknown_route)
        .with_state(state)
}

async fn unknown_route(uri: axum::http::Uri) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "route not found")
        .with_details(json!({ "path": uri.path() }))
}
