//! End-to-end flows across signup, QR links and emergency access.

use carelink_core::auth::{AuthService, SignupRequest};
use carelink_core::db::Database;
use carelink_core::emergency::EmergencyService;
use carelink_core::models::Role;
use carelink_core::notify::NotificationSink;
use carelink_core::qr::QrManager;
use carelink_core::{ServiceError, TokenService};

fn patient_signup(email: &str) -> SignupRequest {
    SignupRequest {
        email: email.to_string(),
        password: "hunter22".to_string(),
        role: "patient".to_string(),
        fullname: Some("Awa Diallo".to_string()),
        first_name: None,
        last_name: None,
        birth_date: Some("1990-04-02".to_string()),
        sex_at_birth: Some("F".to_string()),
        phone: None,
        emergency_contact_name: Some("Moussa Diallo".to_string()),
        emergency_contact_phone: Some("+221770000000".to_string()),
        consent_for_data_processing: true,
        license_number: None,
        specialty: None,
        department: None,
    }
}

fn agent_signup(email: &str) -> SignupRequest {
    SignupRequest {
        email: email.to_string(),
        password: "hunter22".to_string(),
        role: "agent".to_string(),
        fullname: Some("Dr Ba".to_string()),
        first_name: None,
        last_name: None,
        birth_date: None,
        sex_at_birth: None,
        phone: None,
        emergency_contact_name: None,
        emergency_contact_phone: None,
        consent_for_data_processing: false,
        license_number: Some("SN-1234".to_string()),
        specialty: Some("urgences".to_string()),
        department: None,
    }
}

struct World {
    db: Database,
    patient_id: String,
    patient_user_id: String,
    agent_id: String,
}

fn setup() -> World {
    let db = Database::open_in_memory().unwrap();
    let tokens = TokenService::new("flow-test-secret");
    let auth = AuthService::new(&db, &tokens);

    let patient = auth.signup(patient_signup("awa@example.org")).unwrap();
    let agent = auth.signup(agent_signup("dr@example.org")).unwrap();

    let patient_user_id = patient.user.id.clone();
    let patient_id = db
        .get_patient_by_user_id(&patient_user_id)
        .unwrap()
        .unwrap()
        .patient_id;

    World {
        db,
        patient_id,
        patient_user_id,
        agent_id: agent.user.id,
    }
}

#[test]
fn test_issue_scan_reissue_kills_old_token() {
    let w = setup();
    let qr = QrManager::new(&w.db);

    let first = qr.issue_link(&w.patient_id, &w.agent_id).unwrap();
    let scanned = qr
        .scan(&first.secure_token, Some("Mozilla/5.0"), Some("10.0.0.1"))
        .unwrap();
    assert_eq!(scanned.qr_info.scan_count, 1);
    assert_eq!(scanned.patient.fullname, "Awa Diallo");

    // Rotation: the second link replaces the first atomically
    let second = qr.issue_link(&w.patient_id, &w.agent_id).unwrap();
    assert_eq!(w.db.count_active_qr_links(&w.patient_id).unwrap(), 1);
    assert!(matches!(
        qr.scan(&first.secure_token, None, None),
        Err(ServiceError::NotFound(_))
    ));
    assert_eq!(
        qr.scan(&second.secure_token, None, None)
            .unwrap()
            .qr_info
            .scan_count,
        1
    );
}

#[test]
fn test_grant_is_visible_to_the_auditor() {
    let w = setup();
    let emergency = EmergencyService::new(&w.db);

    let bundle = emergency
        .grant_access(
            &w.patient_id,
            &w.agent_id,
            "424242",
            "road accident",
            Some("41.0.0.1"),
            Some("carelink-mobile/2.1"),
        )
        .unwrap();
    assert_eq!(bundle.agent.license_number.as_deref(), Some("SN-1234"));

    // Exactly one row, carrying the full request context
    let logs = emergency.list_logs(None, None, None).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].patient_id, w.patient_id);
    assert_eq!(logs[0].access_reason, "road accident");
    assert_eq!(logs[0].user_agent.as_deref(), Some("carelink-mobile/2.1"));

    // The snapshot is the critical projection, nothing more. serde_json maps
    // iterate in sorted key order.
    let snapshot: serde_json::Value = serde_json::from_str(&logs[0].accessed_data).unwrap();
    let keys: Vec<&str> = snapshot.as_object().unwrap().keys().map(|k| k.as_str()).collect();
    assert_eq!(
        keys,
        [
            "allergies",
            "bloodType",
            "chronicConditions",
            "currentMedications",
            "emergencyContact",
            "pregnantCurrent",
            "vitalSigns"
        ]
    );
}

#[test]
fn test_qr_mediated_emergency_access() {
    let w = setup();
    let qr = QrManager::new(&w.db);
    let emergency = EmergencyService::new(&w.db);

    let issued = qr.issue_link(&w.patient_id, &w.agent_id).unwrap();
    let bundle = qr
        .emergency_access(
            &issued.secure_token,
            &w.agent_id,
            "424242",
            "unconscious patient",
            Some("10.0.0.1"),
            None,
        )
        .unwrap();
    assert_eq!(bundle.patient.patient_id, w.patient_id);

    // The scan side effects ran before the grant
    assert_eq!(
        w.db.get_qr_link_by_token(&issued.secure_token)
            .unwrap()
            .unwrap()
            .scan_count,
        1
    );
    assert_eq!(emergency.list_logs(None, None, None).unwrap().len(), 1);

    // Bad code fails before the scan even happens
    assert!(qr
        .emergency_access(&issued.secure_token, &w.agent_id, "12ab56", "x", None, None)
        .is_err());
    assert_eq!(
        w.db.get_qr_link_by_token(&issued.secure_token)
            .unwrap()
            .unwrap()
            .scan_count,
        1
    );
}

#[test]
fn test_patient_is_notified_of_scan_and_grant() {
    let w = setup();
    let qr = QrManager::new(&w.db);

    let issued = qr.issue_link(&w.patient_id, &w.agent_id).unwrap();
    qr.scan(&issued.secure_token, None, None).unwrap();
    EmergencyService::new(&w.db)
        .grant_access(&w.patient_id, &w.agent_id, "424242", "triage", None, None)
        .unwrap();

    let feed = NotificationSink::new(&w.db)
        .list_for_user(&w.patient_user_id, 50)
        .unwrap();
    assert_eq!(feed.unread_count, 2);
    let kinds: Vec<&str> = feed.notifications.iter().map(|n| n.kind.as_str()).collect();
    assert!(kinds.contains(&"qr_scan"));
    assert!(kinds.contains(&"emergency_access"));
}

#[test]
fn test_login_round_trip_carries_role() {
    let w = setup();
    let tokens = TokenService::new("flow-test-secret");
    let auth = AuthService::new(&w.db, &tokens);

    let login = auth.login("dr@example.org", "hunter22").unwrap();
    let claims = tokens.verify(&login.token).unwrap();
    assert_eq!(claims.role, Role::Agent);
    assert_eq!(claims.sub, w.agent_id);

    assert!(matches!(
        auth.login("dr@example.org", "wrong"),
        Err(ServiceError::Unauthenticated(_))
    ));
}
