//! Signup request gateway.
//!
//! Translates submit/list/approve/reject into record store calls and maps
//! the returned rows into [`SignupRequest`] view objects. Without a store
//! every operation short-circuits with [`AppError::BackendUnavailable`].

use crate::error::AppError;
use crate::models::{
    record_timestamp, NewSignupRequest, SignupRequest, SignupRequestRecord, SignupStatus,
};
use crate::services::record_store::{
    from_record, to_record, Direction, Filter, RecordStore, SelectQuery,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Collection holding signup requests.
pub const COLLECTION: &str = "signup_requests";

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;
const EMAIL_MAX_CHARS: usize = 255;
const STUDENT_ID_MAX_CHARS: usize = 50;
const MESSAGE_MAX_CHARS: usize = 1000;

/// Whether approve/reject may overwrite an already reviewed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionGuard {
    /// Update by id only. A second review overwrites the first.
    #[default]
    Unguarded,
    /// Update only while the stored status is still `pending`.
    PendingOnly,
}

/// Row written on submission.
#[derive(Serialize)]
struct SignupRequestInsert<'a> {
    id: String,
    name: &'a str,
    email: &'a str,
    student_id: Option<&'a str>,
    department_id: &'a str,
    message: Option<&'a str>,
    status: SignupStatus,
    reviewed_by: Option<&'a str>,
    reviewed_at: Option<String>,
    created_at: String,
}

/// Patch written on review.
#[derive(Serialize)]
struct ReviewPatch<'a> {
    status: SignupStatus,
    reviewed_by: &'a str,
    reviewed_at: String,
}

/// Gateway over the `signup_requests` collection.
#[derive(Clone, Default)]
pub struct SignupRequestManager {
    store: Option<Arc<dyn RecordStore>>,
    guard: TransitionGuard,
}

impl SignupRequestManager {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store: Some(store),
            guard: TransitionGuard::default(),
        }
    }

    /// A gateway with no backend; every operation reports "Database not configured".
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn from_optional(store: Option<Arc<dyn RecordStore>>) -> Self {
        Self {
            store,
            guard: TransitionGuard::default(),
        }
    }

    pub fn with_guard(mut self, guard: TransitionGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> Result<&Arc<dyn RecordStore>, AppError> {
        self.store.as_ref().ok_or(AppError::BackendUnavailable)
    }

    /// Submit a new request with status `pending` and no review fields.
    ///
    /// Duplicate submissions are not detected.
    pub async fn submit(&self, input: NewSignupRequest) -> Result<(), AppError> {
        let store = self.store()?;
        let input = validate_submission(input)?;

        let record = to_record(&SignupRequestInsert {
            id: uuid::Uuid::new_v4().to_string(),
            name: &input.name,
            email: &input.email,
            student_id: input.student_id.as_deref(),
            department_id: &input.department_id,
            message: input.message.as_deref(),
            status: SignupStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            created_at: record_timestamp(Utc::now()),
        })?;

        store.insert(COLLECTION, record).await.map_err(|e| {
            log::error!("[signup] Error creating signup request: {}", e);
            AppError::from(e)
        })?;

        log::info!(
            "[signup] New request for department {}",
            input.department_id
        );
        Ok(())
    }

    /// List requests, newest first, optionally for one department.
    ///
    /// Store failures are logged and yield an empty list, so an empty result
    /// does not prove there are no requests.
    pub async fn list(&self, department_id: Option<&str>) -> Vec<SignupRequest> {
        let Some(store) = self.store.as_ref() else {
            return Vec::new();
        };

        let mut query = SelectQuery::from(COLLECTION)
            .embed("departments", "department_id", &["name", "code"])
            .order_by("created_at", Direction::Descending);
        if let Some(department_id) = department_id.filter(|d| !d.is_empty()) {
            query = query.eq("department_id", department_id);
        }

        match store.select(&query).await {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|row| match from_record::<SignupRequestRecord>(row) {
                    Ok(record) => Some(SignupRequest::from(record)),
                    Err(e) => {
                        log::warn!("[signup] Skipping undecodable signup request: {}", e);
                        None
                    }
                })
                .collect(),
            Err(e) => {
                log::error!("[signup] Error fetching signup requests: {}", e);
                Vec::new()
            }
        }
    }

    /// Fetch one request by id. A failed fetch is reported as not found.
    pub async fn get(&self, request_id: &str) -> Result<SignupRequest, AppError> {
        let store = self.store()?;

        let query = SelectQuery::from(COLLECTION)
            .eq("id", request_id)
            .embed("departments", "department_id", &["name", "code"])
            .limit(1);

        let row = match store.select(&query).await {
            Ok(rows) => rows.into_iter().next(),
            Err(e) => {
                log::warn!("[signup] Error fetching signup request {}: {}", request_id, e);
                None
            }
        };

        row.and_then(|row| from_record::<SignupRequestRecord>(row).ok())
            .map(SignupRequest::from)
            .ok_or_else(|| AppError::not_found_with_id("Request", request_id))
    }

    /// Mark a request approved.
    ///
    /// The login account is not created here. The credential only travels
    /// back to the operator, who relays it to whoever provisions accounts;
    /// it is never written to the store.
    pub async fn approve(
        &self,
        request_id: &str,
        reviewer_id: &str,
        _temporary_credential: &str,
    ) -> Result<(), AppError> {
        self.review(request_id, reviewer_id, SignupStatus::Approved)
            .await
    }

    /// Mark a request rejected.
    pub async fn reject(&self, request_id: &str, reviewer_id: &str) -> Result<(), AppError> {
        self.review(request_id, reviewer_id, SignupStatus::Rejected)
            .await
    }

    async fn review(
        &self,
        request_id: &str,
        reviewer_id: &str,
        status: SignupStatus,
    ) -> Result<(), AppError> {
        let store = self.store()?;
        let existing = self.get(request_id).await?;

        let mut filters = vec![Filter::eq("id", request_id)];
        if existing.status.is_terminal() {
            if self.guard == TransitionGuard::PendingOnly {
                return Err(AppError::conflict(format!(
                    "Request {} is already {}",
                    request_id, existing.status
                )));
            }
            log::warn!(
                "[signup] Request {} is already {}; overwriting with {}",
                request_id,
                existing.status,
                status
            );
        }
        if self.guard == TransitionGuard::PendingOnly {
            filters.push(Filter::eq("status", SignupStatus::Pending.as_str()));
        }

        let patch = to_record(&ReviewPatch {
            status,
            reviewed_by: reviewer_id,
            reviewed_at: record_timestamp(Utc::now()),
        })?;

        let changed = store
            .update(COLLECTION, &filters, patch)
            .await
            .map_err(|e| {
                log::error!("[signup] Error marking request {} {}: {}", request_id, status, e);
                AppError::from(e)
            })?;

        if changed == 0 && self.guard == TransitionGuard::PendingOnly {
            return Err(AppError::conflict(format!(
                "Request {} was reviewed by someone else",
                request_id
            )));
        }

        log::info!(
            "[signup] Request {} {} by {}",
            request_id,
            status,
            reviewer_id
        );
        Ok(())
    }
}

/// Trim and bound-check a submission. Blank optional fields become `None`.
fn validate_submission(input: NewSignupRequest) -> Result<NewSignupRequest, AppError> {
    let name = input.name.trim().to_string();
    let name_len = name.chars().count();
    if name_len < NAME_MIN_CHARS {
        return Err(AppError::invalid_input_field(
            "Name must be at least 2 characters",
            "name",
        ));
    }
    if name_len > NAME_MAX_CHARS {
        return Err(AppError::invalid_input_field(
            "Name must be less than 100 characters",
            "name",
        ));
    }

    let email = input.email.trim().to_string();
    if !is_valid_email(&email) {
        return Err(AppError::invalid_input_field("Invalid email address", "email"));
    }
    if email.chars().count() > EMAIL_MAX_CHARS {
        return Err(AppError::invalid_input_field(
            "Email must be less than 255 characters",
            "email",
        ));
    }

    let department_id = input.department_id.trim().to_string();
    if department_id.is_empty() {
        return Err(AppError::invalid_input_field(
            "Department is required",
            "departmentId",
        ));
    }

    let student_id = non_blank(input.student_id);
    if student_id
        .as_ref()
        .is_some_and(|s| s.chars().count() > STUDENT_ID_MAX_CHARS)
    {
        return Err(AppError::invalid_input_field(
            "Student ID must be less than 50 characters",
            "studentId",
        ));
    }

    let message = non_blank(input.message);
    if message
        .as_ref()
        .is_some_and(|m| m.chars().count() > MESSAGE_MAX_CHARS)
    {
        return Err(AppError::invalid_input_field(
            "Message must be less than 1000 characters",
            "message",
        ));
    }

    Ok(NewSignupRequest {
        name,
        email,
        department_id,
        student_id,
        message,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `local@domain.tld` with no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::record_store::{Record, StoreError};
    use async_trait::async_trait;

    /// Store whose every call fails the way a misconfigured project does.
    struct FailingStore;

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn select(&self, _query: &SelectQuery) -> Result<Vec<Record>, StoreError> {
            Err(StoreError::Remote {
                message: "permission denied for table signup_requests".to_string(),
                status: Some(401),
            })
        }

        async fn insert(&self, _collection: &str, _record: Record) -> Result<Record, StoreError> {
            Err(StoreError::Remote {
                message: "new row violates row-level security policy".to_string(),
                status: Some(403),
            })
        }

        async fn update(
            &self,
            _collection: &str,
            _filters: &[Filter],
            _patch: Record,
        ) -> Result<u64, StoreError> {
            Err(StoreError::Transport("Request timed out".to_string()))
        }

        async fn delete(&self, _collection: &str, _filters: &[Filter]) -> Result<u64, StoreError> {
            Err(StoreError::Transport("Request timed out".to_string()))
        }
    }

    fn jane() -> NewSignupRequest {
        NewSignupRequest::new("Jane Doe", "jane@example.com", "CS-1")
    }

    #[tokio::test]
    async fn test_unconfigured_short_circuits() {
        let gateway = SignupRequestManager::unconfigured();

        for result in [
            gateway.submit(jane()).await,
            gateway.approve("r-1", "admin-1", "ab12cd34").await,
            gateway.reject("r-1", "admin-1").await,
        ] {
            let err = result.unwrap_err();
            assert!(err.is_backend_unavailable());
            assert_eq!(err.to_string(), "Database not configured");
        }

        assert!(gateway.list(None).await.is_empty());
        assert!(gateway.list(Some("CS-1")).await.is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_wins_over_validation() {
        let gateway = SignupRequestManager::unconfigured();
        let err = gateway
            .submit(NewSignupRequest::new("", "not-an-email", ""))
            .await
            .unwrap_err();
        assert!(err.is_backend_unavailable());
    }

    #[tokio::test]
    async fn test_insert_failure_carries_store_message() {
        let gateway = SignupRequestManager::new(Arc::new(FailingStore));
        let err = gateway.submit(jane()).await.unwrap_err();
        assert!(matches!(err, AppError::Remote { .. }));
        assert_eq!(err.to_string(), "new row violates row-level security policy");
    }

    #[tokio::test]
    async fn test_list_swallows_store_errors() {
        let gateway = SignupRequestManager::new(Arc::new(FailingStore));
        assert!(gateway.list(Some("CS-1")).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_reports_not_found() {
        let gateway = SignupRequestManager::new(Arc::new(FailingStore));
        let err = gateway.approve("r-1", "admin-1", "ab12cd34").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.to_string(), "Request not found");
    }

    #[test]
    fn test_validate_submission_normalizes() {
        let input = NewSignupRequest::new("  Jane Doe ", " jane@example.com ", "CS-1")
            .with_student_id("   ")
            .with_message(" Please let me in ");
        let normalized = validate_submission(input).unwrap();

        assert_eq!(normalized.name, "Jane Doe");
        assert_eq!(normalized.email, "jane@example.com");
        assert_eq!(normalized.student_id, None);
        assert_eq!(normalized.message.as_deref(), Some("Please let me in"));
    }

    #[test]
    fn test_validate_submission_rejects_bad_fields() {
        let cases = [
            (NewSignupRequest::new("J", "jane@example.com", "CS-1"), "name"),
            (NewSignupRequest::new("x".repeat(101), "jane@example.com", "CS-1"), "name"),
            (NewSignupRequest::new("Jane", "jane.example.com", "CS-1"), "email"),
            (NewSignupRequest::new("Jane", "jane@example.com", " "), "departmentId"),
            (
                NewSignupRequest::new("Jane", "jane@example.com", "CS-1").with_student_id("9".repeat(51)),
                "studentId",
            ),
        ];

        for (input, field) in cases {
            let err = validate_submission(input).unwrap_err();
            assert_eq!(err.field(), Some(field));
        }
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("j.doe+lms@cs.uni.edu"));
        assert!(!is_valid_email("jane@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane@@example.com"));
        assert!(!is_valid_email("jane doe@example.com"));
        assert!(!is_valid_email("jane@example..com"));
    }
}
