//! End-to-end API tests over the in-memory router.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use carelink_core::{Database, TokenService};
use carelink_http::{router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const TEST_SECRET: &str = "api-test-secret";

fn app() -> Router {
    let db = Database::open_in_memory().unwrap();
    let state = AppState::new(db, TokenService::new(TEST_SECRET));
    router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn patient_signup(email: &str) -> Value {
    json!({
        "email": email,
        "password": "hunter22",
        "role": "patient",
        "fullname": "Awa Diallo",
        "birthDate": "1990-04-02",
        "sexAtBirth": "F",
        "consentForDataProcessing": true,
    })
}

fn agent_signup(email: &str) -> Value {
    json!({
        "email": email,
        "password": "hunter22",
        "role": "agent",
        "fullname": "Dr Ba",
        "licenseNumber": "SN-1234",
    })
}

async fn login(app: &Router, email: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": email, "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

/// Signup a patient and an agent, return (agent_token, patient_token,
/// patient_id).
async fn seed(app: &Router) -> (String, String, String) {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/signup",
        None,
        Some(patient_signup("awa@example.org")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        app,
        Method::POST,
        "/api/signup",
        None,
        Some(agent_signup("dr@example.org")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let agent = login(app, "dr@example.org").await;
    let patient = login(app, "awa@example.org").await;
    let patient_id = patient["patient"]["patientId"].as_str().unwrap().to_string();
    (
        agent["token"].as_str().unwrap().to_string(),
        patient["token"].as_str().unwrap().to_string(),
        patient_id,
    )
}

#[tokio::test]
async fn test_signup_login_me_flow() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/signup",
        None,
        Some(patient_signup("awa@example.org")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ok"], true);
    assert_eq!(body["user"]["email"], "awa@example.org");
    assert!(body["user"].get("passwordHash").is_none());

    let login = login(&app, "awa@example.org").await;
    assert_eq!(login["ok"], true);
    let token = login["token"].as_str().unwrap();

    let (status, me) = send(&app, Method::GET, "/api/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], "awa@example.org");
    assert_eq!(me["patient"]["firstName"], "Awa");
}

#[tokio::test]
async fn test_login_failure_is_401_with_error_envelope() {
    let app = app();
    send(
        &app,
        Method::POST,
        "/api/signup",
        None,
        Some(patient_signup("awa@example.org")),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "awa@example.org", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn test_qr_generate_forbidden_for_patients() {
    let app = app();
    let (_, patient_token, patient_id) = seed(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/qr/generate/{patient_id}"),
        Some(&patient_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "insufficient permissions");
}

#[tokio::test]
async fn test_qr_generate_and_public_scan() {
    let app = app();
    let (agent_token, _, patient_id) = seed(&app).await;

    let (status, issued) = send(
        &app,
        Method::POST,
        &format!("/api/qr/generate/{patient_id}"),
        Some(&agent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = issued["qrLink"]["secureToken"].as_str().unwrap();
    assert_eq!(token.len(), 64);
    assert_eq!(
        issued["qrLink"]["qrUrl"],
        format!("/patient/scan/{token}")
    );

    // Scan requires no authentication
    let (status, scanned) = send(
        &app,
        Method::GET,
        &format!("/api/qr/scan/{token}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scanned["ok"], true);
    assert_eq!(scanned["patient"]["fullname"], "Awa Diallo");
    assert_eq!(scanned["qrInfo"]["scanCount"], 1);

    // Unknown tokens keep the envelope shape
    let (status, body) = send(&app, Method::GET, "/api/qr/scan/deadbeef", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);

    // Deactivation confirms with a message and kills the token
    let link_id = issued["qrLink"]["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/qr/{link_id}"),
        Some(&agent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "QR code deactivated");
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/qr/scan/{token}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_emergency_access_and_admin_log_listing() {
    let app = app();
    let (agent_token, patient_token, patient_id) = seed(&app).await;

    let (status, bundle) = send(
        &app,
        Method::POST,
        &format!("/api/emergency/access/{patient_id}"),
        Some(&agent_token),
        Some(json!({ "accessCode": "424242", "accessReason": "road accident" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bundle["emergency"]["patient"]["fullname"], "Awa Diallo");
    assert!(bundle["emergency"]["criticalInfo"]
        .get("emergencyContact")
        .is_some());

    // Bad code is a 400 with no data
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/emergency/access/{patient_id}"),
        Some(&agent_token),
        Some(json!({ "accessCode": "12ab", "accessReason": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);

    // The report rides under its own key
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/emergency/report/{patient_id}"),
        Some(&agent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["patient"]["fullname"], "Awa Diallo");
    assert_eq!(body["report"]["recentAccess"].as_array().unwrap().len(), 1);

    // Log listing is admin-only
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/emergency/logs",
        Some(&agent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/emergency/logs",
        Some(&patient_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin sees the grant in the audit trail
    let admin = carelink_core::models::User::new(
        "root@example.org".into(),
        "s$h".into(),
        carelink_core::models::Role::Admin,
    );
    let admin_token = TokenService::new(TEST_SECRET).issue(&admin).unwrap();
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/emergency/logs",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["logs"].as_array().unwrap().len(), 1);
    assert_eq!(body["total"], 1);
    assert_eq!(body["logs"][0]["accessReason"], "road accident");
}

#[tokio::test]
async fn test_notification_feed_after_scan() {
    let app = app();
    let (agent_token, patient_token, patient_id) = seed(&app).await;

    let (_, issued) = send(
        &app,
        Method::POST,
        &format!("/api/qr/generate/{patient_id}"),
        Some(&agent_token),
        None,
    )
    .await;
    let token = issued["qrLink"]["secureToken"].as_str().unwrap();
    send(&app, Method::GET, &format!("/api/qr/scan/{token}"), None, None).await;

    let (status, feed) = send(
        &app,
        Method::GET,
        "/api/notifications",
        Some(&patient_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed["unreadCount"], 1);
    assert_eq!(feed["notifications"][0]["type"], "qr_scan");

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/notifications/mark-all-read",
        Some(&patient_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["markedAllRead"], true);

    let (_, feed) = send(
        &app,
        Method::GET,
        "/api/notifications",
        Some(&patient_token),
        None,
    )
    .await;
    assert_eq!(feed["unreadCount"], 0);
}

#[tokio::test]
async fn test_unknown_route_envelope() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);
    assert_eq!(body["details"]["path"], "/api/nope");
}
