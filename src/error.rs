//! Application error types.
//!
//! These errors are serializable so that the HTTP layer and the dashboard
//! controller can hand a meaningful message back to the operator.

use serde::Serialize;
use thiserror::Error;

/// Message returned by every gateway operation while no record store is configured.
pub const BACKEND_UNAVAILABLE_MESSAGE: &str = "Database not configured";

/// Application-level errors.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// No record store client is configured.
    #[error("Database not configured")]
    BackendUnavailable,

    /// The record store rejected the operation. Carries the store's message verbatim.
    #[error("{message}")]
    Remote {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// Local database operation failed.
    #[error("Database error: {message}")]
    Database { message: String },

    /// Requested resource not found.
    #[error("{resource} not found")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Invalid input provided.
    #[error("{message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// A guarded transition found the record no longer pending.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a remote store error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a remote store error with the HTTP status it came with.
    pub fn remote_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Remote {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error means the backend was never configured.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable)
    }

    /// Get the field name if this is a validation error.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidInput { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

// Conversions from lower-layer error types

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        Self::database(err.to_string())
    }
}

impl From<crate::services::record_store::StoreError> for AppError {
    fn from(err: crate::services::record_store::StoreError) -> Self {
        use crate::services::record_store::StoreError;
        match err {
            StoreError::Remote { message, status } => match status {
                Some(code) => Self::remote_with_status(message, code),
                None => Self::remote(message),
            },
            other => Self::remote(other.to_string()),
        }
    }
}

/// The `{success, error?}` result shape handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    /// A successful result.
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A failed result carrying the given message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

impl<T> From<Result<T, AppError>> for OperationResult {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = AppError::database("connection failed");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"Database\""));
        assert!(json.contains("connection failed"));
    }

    #[test]
    fn test_backend_unavailable_message() {
        assert_eq!(
            AppError::BackendUnavailable.to_string(),
            BACKEND_UNAVAILABLE_MESSAGE
        );
    }

    #[test]
    fn test_remote_error_is_verbatim() {
        let err = AppError::remote("duplicate key value violates unique constraint");
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
    }

    #[test]
    fn test_not_found_with_id() {
        let err = AppError::not_found_with_id("Request", "abc");
        assert_eq!(err.to_string(), "Request not found");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"resource\":\"Request\""));
        assert!(json.contains("\"id\":\"abc\""));
    }

    #[test]
    fn test_optional_fields_not_serialized() {
        let err = AppError::remote("permission denied");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("status_code"));

        let json = serde_json::to_string(&AppError::remote_with_status("permission denied", 403)).unwrap();
        assert!(json.contains("\"status_code\":403"));
    }

    #[test]
    fn test_store_error_keeps_remote_status() {
        use crate::services::record_store::StoreError;

        let err = AppError::from(StoreError::Remote {
            message: "JWT expired".to_string(),
            status: Some(401),
        });
        assert!(matches!(
            err,
            AppError::Remote { status_code: Some(401), .. }
        ));
        assert_eq!(err.to_string(), "JWT expired");

        let err = AppError::from(StoreError::Transport("connection refused".to_string()));
        assert!(matches!(err, AppError::Remote { status_code: None, .. }));
    }

    #[test]
    fn test_operation_result_from_error() {
        let result: Result<(), AppError> = Err(AppError::BackendUnavailable);
        let op = OperationResult::from(result);
        assert!(!op.success);
        assert_eq!(op.error.as_deref(), Some("Database not configured"));

        let json = serde_json::to_string(&OperationResult::ok()).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }
}
