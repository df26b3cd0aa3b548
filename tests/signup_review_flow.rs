//! End-to-end signup request lifecycle against a local SQLite store.
//!
//! Covers submission, department-scoped listing, approval, rejection, the
//! repeated-review behavior in both guard modes, and the unconfigured gateway.

mod common;

use common::{seeded_store, tick};
use lms_admin::error::AppError;
use lms_admin::models::{NewSignupRequest, SignupStatus};
use lms_admin::services::record_store::SelectQuery;
use lms_admin::services::{RecordStore, SignupRequestManager, TransitionGuard};

fn jane() -> NewSignupRequest {
    NewSignupRequest::new("Jane Doe", "jane@example.com", "CS-1")
        .with_message("I'd like to join the CS program")
}

#[tokio::test]
async fn test_submit_then_list_shows_pending_request() {
    let (_dir, store) = seeded_store().await;
    let manager = SignupRequestManager::new(store);

    manager.submit(jane()).await.unwrap();

    let requests = manager.list(Some("CS-1")).await;
    assert_eq!(requests.len(), 1);

    let request = &requests[0];
    assert_eq!(request.name, "Jane Doe");
    assert_eq!(request.status, SignupStatus::Pending);
    assert!(request.reviewed_by.is_none());
    assert!(request.reviewed_at.is_none());
    assert!(request.review_fields_consistent());

    let department = request.department.as_ref().unwrap();
    assert_eq!(department.code, "CS");
    assert_eq!(department.name, "Computer Science");
}

#[tokio::test]
async fn test_approve_records_reviewer_and_time() {
    let (_dir, store) = seeded_store().await;
    let manager = SignupRequestManager::new(store);

    manager.submit(jane()).await.unwrap();
    let id = manager.list(Some("CS-1")).await[0].id.clone();

    manager.approve(&id, "admin-1", "ab12cd34").await.unwrap();

    let request = manager.get(&id).await.unwrap();
    assert_eq!(request.status, SignupStatus::Approved);
    assert_eq!(request.reviewed_by.as_deref(), Some("admin-1"));
    assert!(request.reviewed_at.unwrap() >= request.created_at);
    assert!(request.review_fields_consistent());
}

#[tokio::test]
async fn test_reject_records_reviewer() {
    let (_dir, store) = seeded_store().await;
    let manager = SignupRequestManager::new(store);

    manager.submit(jane()).await.unwrap();
    let id = manager.list(None).await[0].id.clone();

    manager.reject(&id, "admin-1").await.unwrap();

    let request = manager.get(&id).await.unwrap();
    assert_eq!(request.status, SignupStatus::Rejected);
    assert_eq!(request.reviewed_by.as_deref(), Some("admin-1"));
    assert!(request.reviewed_at.is_some());
}

#[tokio::test]
async fn test_reviews_store_no_credential() {
    let (_dir, store) = seeded_store().await;
    let manager = SignupRequestManager::new(store.clone());

    manager.submit(jane()).await.unwrap();
    tick().await;
    manager
        .submit(NewSignupRequest::new("Raj Patel", "raj@example.com", "CS-1"))
        .await
        .unwrap();
    let requests = manager.list(Some("CS-1")).await;
    manager
        .approve(&requests[0].id, "admin-1", "ab12cd34")
        .await
        .unwrap();
    manager.reject(&requests[1].id, "admin-1").await.unwrap();

    let rows = store
        .select(&SelectQuery::from("signup_requests"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let expected_columns = [
        "created_at",
        "department_id",
        "email",
        "id",
        "message",
        "name",
        "reviewed_at",
        "reviewed_by",
        "status",
        "student_id",
    ];
    for row in &rows {
        let mut columns: Vec<&str> = row.keys().map(String::as_str).collect();
        columns.sort_unstable();
        assert_eq!(columns, expected_columns);
        assert!(row.values().all(|v| v.as_str() != Some("ab12cd34")));
    }
}

#[tokio::test]
async fn test_unguarded_second_review_overwrites() {
    let (_dir, store) = seeded_store().await;
    let manager = SignupRequestManager::new(store);

    manager.submit(jane()).await.unwrap();
    let id = manager.list(None).await[0].id.clone();

    manager.approve(&id, "admin-1", "ab12cd34").await.unwrap();
    manager.reject(&id, "admin-2").await.unwrap();

    let request = manager.get(&id).await.unwrap();
    assert_eq!(request.status, SignupStatus::Rejected);
    assert_eq!(request.reviewed_by.as_deref(), Some("admin-2"));
}

#[tokio::test]
async fn test_guarded_second_review_conflicts() {
    let (_dir, store) = seeded_store().await;
    let manager = SignupRequestManager::new(store).with_guard(TransitionGuard::PendingOnly);

    manager.submit(jane()).await.unwrap();
    let id = manager.list(None).await[0].id.clone();

    manager.approve(&id, "admin-1", "ab12cd34").await.unwrap();
    let err = manager.reject(&id, "admin-2").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict { .. }));

    let request = manager.get(&id).await.unwrap();
    assert_eq!(request.status, SignupStatus::Approved);
    assert_eq!(request.reviewed_by.as_deref(), Some("admin-1"));
}

#[tokio::test]
async fn test_review_of_missing_request_is_not_found() {
    let (_dir, store) = seeded_store().await;
    let manager = SignupRequestManager::new(store);

    let err = manager.approve("missing", "admin-1", "ab12cd34").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
    assert_eq!(err.to_string(), "Request not found");

    let err = manager.reject("missing", "admin-1").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn test_list_filters_by_department_newest_first() {
    let (_dir, store) = seeded_store().await;
    let manager = SignupRequestManager::new(store);

    manager.submit(jane()).await.unwrap();
    tick().await;
    manager
        .submit(NewSignupRequest::new("Max Mustermann", "max@example.com", "MA-1"))
        .await
        .unwrap();
    tick().await;
    manager
        .submit(NewSignupRequest::new("Raj Patel", "raj@example.com", "CS-1").with_student_id("S-42"))
        .await
        .unwrap();

    let cs: Vec<String> = manager
        .list(Some("CS-1"))
        .await
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(cs, vec!["Raj Patel", "Jane Doe"]);

    let all = manager.list(None).await;
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    assert_eq!(manager.list(Some("")).await.len(), 3);
    assert!(manager.list(Some("XX-9")).await.is_empty());
}

#[tokio::test]
async fn test_submit_to_unknown_department_fails() {
    let (_dir, store) = seeded_store().await;
    let manager = SignupRequestManager::new(store);

    let err = manager
        .submit(NewSignupRequest::new("Jane Doe", "jane@example.com", "NOPE"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Remote { .. }));
    assert!(manager.list(None).await.is_empty());
}

#[tokio::test]
async fn test_unconfigured_gateway() {
    let manager = SignupRequestManager::unconfigured();

    let err = manager.submit(jane()).await.unwrap_err();
    assert_eq!(err.to_string(), "Database not configured");

    let err = manager.approve("r-1", "admin-1", "ab12cd34").await.unwrap_err();
    assert!(err.is_backend_unavailable());

    let err = manager.reject("r-1", "admin-1").await.unwrap_err();
    assert!(err.is_backend_unavailable());

    assert!(manager.list(Some("CS-1")).await.is_empty());
}
