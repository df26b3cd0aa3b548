//! Data models for the application.
//!
//! These models mirror the collections of the record store and the view
//! objects handed to the dashboard. Records are decoded from JSON rows, so
//! every model derives `Deserialize`; view objects derive `Serialize` for
//! the HTTP layer.

pub mod course;
pub mod department;
pub mod signup_request;
pub mod user_profile;

// Re-exports for convenient access
pub use course::Course;
pub use department::{Department, DepartmentSummary};
pub use signup_request::{NewSignupRequest, SignupRequest, SignupRequestRecord, SignupStatus};
pub use user_profile::{UserProfile, UserRole};

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp the way it is written to the record store.
///
/// Fixed microsecond precision keeps text ordering equal to time ordering.
pub fn record_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Deserialize a boolean column that SQLite hands back as 0/1.
pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde::Deserialize;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        serde_json::Value::Null => Ok(false),
        other => Err(D::Error::custom(format!("expected boolean flag, got {}", other))),
    }
}
