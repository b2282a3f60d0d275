//! HTTP error envelope: every failure serializes as
//! `{"ok": false, "error": "...", "details": ...?}` with a matching status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use carelink_core::ServiceError;
use serde_json::{json, Value};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let status = match &e {
            ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Internal details stay in the log, not on the wire; other variants
        // expose their bare message without the taxonomy prefix
        let message = match e {
            ServiceError::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                "internal server error".to_string()
            }
            ServiceError::Unauthenticated(m)
            | ServiceError::Forbidden(m)
            | ServiceError::NotFound(m)
            | ServiceError::BadRequest(m)
            | ServiceError::Conflict(m) => m,
        };
        Self::new(status, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "ok": false, "error": self.message });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

/// Wrap a successful payload in the `{"ok": true, ...}` envelope. The payload
/// must serialize to a JSON object; its fields are spliced in beside `ok`.
pub fn envelope<T: serde::Serialize>(payload: &T) -> Result<Json<Value>, ApiError> {
    let mut value = serde_json::to_value(payload)
        .map_err(|e| ApiError::internal(format!("response serialization failed: {e}")))?;
    match value.as_object_mut() {
        Some(map) => {
            map.insert("ok".to_string(), Value::Bool(true));
            Ok(Json(value))
        }
        None => Err(ApiError::internal("response payload is not an object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_status_mapping() {
        let cases = [
            (
                ServiceError::Unauthenticated("x".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_detail_is_masked() {
        let api = ApiError::from(ServiceError::Internal("db exploded at row 7".into()));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "internal server error");
    }

    #[test]
    fn test_envelope_splices_ok_flag() {
        let json = envelope(&serde_json::json!({"token": "t"})).unwrap();
        assert_eq!(json.0["ok"], true);
        assert_eq!(json.0["token"], "t");
    }

    #[test]
    fn test_envelope_rejects_non_objects() {
        assert!(envelope(&vec![1, 2, 3]).is_err());
    }
}
