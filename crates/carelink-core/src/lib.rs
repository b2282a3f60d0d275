//! Carelink Core Library
//!
//! Domain core for a patient-carried emergency medical record: accounts and
//! roles, QR access links, the emergency access workflow, and an append-only
//! audit trail, all on local SQLite.
//!
//! # Architecture
//!
//! ```text
//! Signup/Login ──► TokenService (HS256, 8h)
//!                        │
//!                 RouteAccess guard
//!                        │
//!        ┌───────────────┼────────────────┐
//!        ▼               ▼                ▼
//!    QrManager    EmergencyService   NotificationSink
//!   issue/rotate    code check +      fire-and-forget
//!   scan/revoke     snapshot grant       notices
//!        │               │
//!        └───────┬───────┘
//!                ▼
//!      activity_logs / emergency_logs
//!        (append-only, trigger-enforced)
//! ```
//!
//! # Core Principle
//!
//! **Every emergency access leaves a trail.** A grant persists its snapshot
//! before returning data; code or identity failures persist nothing.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (User, Patient, QrLink, EmergencyLog, etc.)
//! - [`auth`]: Password hashing, token service, access-control guard
//! - [`qr`]: QR link issuance, rotation, scanning
//! - [`emergency`]: Emergency access workflow and audit reporting
//! - [`notify`]: In-app notification sink

pub mod auth;
pub mod db;
pub mod emergency;
pub mod error;
pub mod models;
pub mod notify;
pub mod qr;

// Re-export commonly used types
pub use auth::{AuthContext, AuthService, Claims, RouteAccess, TokenService};
pub use db::Database;
pub use emergency::{EmergencyBundle, EmergencyReport, EmergencyService};
pub use error::{ServiceError, ServiceResult};
pub use models::{
    ActivityLog, Agent, CriticalInfo, EmergencyLog, Notification, Patient, QrLink, Role, User,
};
pub use notify::{NotificationFeed, NotificationSink};
pub use qr::{IssuedQrLink, PatientQrLinks, QrManager, ScanOutcome};
