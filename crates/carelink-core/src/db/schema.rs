//! SQLite schema definition.

/// Complete database schema for carelink.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Users & Profiles
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('patient', 'agent', 'admin')),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS agents (
    user_id TEXT PRIMARY KEY REFERENCES users(id),
    license_number TEXT,
    specialty TEXT,
    phone TEXT,
    department TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS patients (
    patient_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL UNIQUE REFERENCES users(id),
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    birth_date TEXT NOT NULL,
    sex_at_birth TEXT NOT NULL,
    phone TEXT,
    blood_type TEXT,
    allergies TEXT,
    chronic_conditions TEXT,
    current_medications TEXT,
    emergency_contact_name TEXT,
    emergency_contact_phone TEXT,
    pregnant_current INTEGER NOT NULL DEFAULT 0,
    height_cm REAL,
    weight_kg REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- QR Links
-- ============================================================================

CREATE TABLE IF NOT EXISTS qr_links (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(patient_id),
    secure_token TEXT NOT NULL UNIQUE,               -- global namespace
    created_by TEXT NOT NULL REFERENCES users(id),
    is_active INTEGER NOT NULL DEFAULT 1,
    expires_at TEXT NOT NULL,
    scan_count INTEGER NOT NULL DEFAULT 0,
    last_scanned_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_qr_links_patient ON qr_links(patient_id);

-- At most one active link per patient, enforced at the storage layer
CREATE UNIQUE INDEX IF NOT EXISTS idx_qr_links_one_active
    ON qr_links(patient_id) WHERE is_active = 1;

-- ============================================================================
-- Audit Trails (Append-Only - Immutable after creation)
-- ============================================================================

CREATE TABLE IF NOT EXISTS emergency_logs (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    agent_id TEXT NOT NULL,                          -- 'anonymous' for public access
    access_code TEXT NOT NULL,
    access_reason TEXT NOT NULL,
    accessed_data TEXT NOT NULL,                     -- JSON snapshot at access time
    ip_address TEXT,
    user_agent TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_emergency_logs_patient ON emergency_logs(patient_id);
CREATE INDEX IF NOT EXISTS idx_emergency_logs_agent ON emergency_logs(agent_id);
CREATE INDEX IF NOT EXISTS idx_emergency_logs_created ON emergency_logs(created_at);

CREATE TRIGGER IF NOT EXISTS emergency_logs_no_update BEFORE UPDATE ON emergency_logs
BEGIN
    SELECT RAISE(ABORT, 'Emergency logs are append-only');
END;

CREATE TRIGGER IF NOT EXISTS emergency_logs_no_delete BEFORE DELETE ON emergency_logs
BEGIN
    SELECT RAISE(ABORT, 'Emergency logs are append-only');
END;

CREATE TABLE IF NOT EXISTS activity_logs (
    id TEXT PRIMARY KEY,
    actor_user_id TEXT NOT NULL,
    action TEXT NOT NULL,
    target_patient_id TEXT,
    details TEXT NOT NULL,
    ip_address TEXT,
    user_agent TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_activity_logs_actor ON activity_logs(actor_user_id);
CREATE INDEX IF NOT EXISTS idx_activity_logs_target ON activity_logs(target_patient_id);

CREATE TRIGGER IF NOT EXISTS activity_logs_no_update BEFORE UPDATE ON activity_logs
BEGIN
    SELECT RAISE(ABORT, 'Activity logs are append-only');
END;

CREATE TRIGGER IF NOT EXISTS activity_logs_no_delete BEFORE DELETE ON activity_logs
BEGIN
    SELECT RAISE(ABORT, 'Activity logs are append-only');
END;

-- ============================================================================
-- Notifications
-- ============================================================================

CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    user_role TEXT NOT NULL,
    kind TEXT NOT NULL,
    message TEXT NOT NULL,
    data TEXT NOT NULL DEFAULT '{}',                 -- JSON payload
    is_read INTEGER NOT NULL DEFAULT 0,
    viewed_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id);
CREATE INDEX IF NOT EXISTS idx_notifications_unread ON notifications(user_id, is_read);
"#;
