//! Signup request model.
//!
//! A signup request is submitted by a prospective student and reviewed once
//! by a department admin. `pending` is the only non-terminal status.

use super::DepartmentSummary;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Review status of a signup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignupStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl SignupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Approved and rejected requests have no outgoing transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for SignupStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(AppError::invalid_input_field(
                format!("Unknown signup status: {}", other),
                "status",
            )),
        }
    }
}

impl std::fmt::Display for SignupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row shape of the `signup_requests` collection, as returned by a joined read.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequestRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub student_id: Option<String>,
    pub department_id: String,
    #[serde(default)]
    pub message: Option<String>,
    pub status: SignupStatus,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Embedded `departments(name, code)`.
    #[serde(default)]
    pub departments: Option<DepartmentSummary>,
}

/// A signup request as shown to reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    pub id: String,
    pub name: String,
    pub email: String,
    pub student_id: Option<String>,
    pub department_id: String,
    pub message: Option<String>,
    pub status: SignupStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<DepartmentSummary>,
}

impl From<SignupRequestRecord> for SignupRequest {
    fn from(record: SignupRequestRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            student_id: record.student_id,
            department_id: record.department_id,
            message: record.message,
            status: record.status,
            reviewed_by: record.reviewed_by,
            reviewed_at: record.reviewed_at,
            created_at: record.created_at,
            department: record.departments,
        }
    }
}

impl SignupRequest {
    /// Only pending requests expose approve/reject actions.
    pub fn is_pending(&self) -> bool {
        self.status == SignupStatus::Pending
    }

    /// Review fields are both unset while pending and both set afterwards.
    pub fn review_fields_consistent(&self) -> bool {
        match self.status {
            SignupStatus::Pending => self.reviewed_by.is_none() && self.reviewed_at.is_none(),
            SignupStatus::Approved | SignupStatus::Rejected => {
                self.reviewed_by.is_some() && self.reviewed_at.is_some()
            }
        }
    }
}

/// Input for submitting a new signup request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSignupRequest {
    pub name: String,
    pub email: String,
    pub department_id: String,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl NewSignupRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        department_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            department_id: department_id.into(),
            student_id: None,
            message: None,
        }
    }

    pub fn with_student_id(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
