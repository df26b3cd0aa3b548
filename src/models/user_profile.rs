//! User profile model.

use serde::{Deserialize, Serialize};

/// Platform role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,
    DepartmentAdmin,
    Instructor,
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::DepartmentAdmin => "department_admin",
            Self::Instructor => "instructor",
            Self::Student => "student",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user profile from the `profiles` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default = "active_by_default", deserialize_with = "super::deserialize_flag")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}
