//! Course listing model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course offered by a department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub department_id: String,
    /// Profile id of the teaching instructor, if assigned.
    #[serde(default)]
    pub instructor_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
