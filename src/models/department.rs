//! Department reference model.

use serde::{Deserialize, Serialize};

/// A department as stored in the `departments` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    /// Short code, e.g. `CS`.
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Denormalized department name and code joined onto a signup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentSummary {
    pub name: String,
    pub code: String,
}
