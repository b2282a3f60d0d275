//! Domain models for the carelink system.

mod audit;
mod notification;
mod patient;
mod qr_link;
mod user;

pub use audit::*;
pub use notification::*;
pub use patient::*;
pub use qr_link::*;
pub use user::*;

/// Current time as an RFC3339 UTC timestamp, the storage format for all
/// `created_at`/`updated_at` columns.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
