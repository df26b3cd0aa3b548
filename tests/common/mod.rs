//! Shared fixtures for integration tests.

#![allow(dead_code)]

use lms_admin::services::record_store::to_record;
use lms_admin::services::{RecordStore, SqliteRecordStore};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary SQLite store seeded with two departments and a few profiles.
pub async fn seeded_store() -> (TempDir, Arc<dyn RecordStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteRecordStore::open(&dir.path().join("lms.db"))
        .await
        .unwrap();

    let rows = [
        ("departments", json!({"id": "CS-1", "name": "Computer Science", "code": "CS"})),
        ("departments", json!({"id": "MA-1", "name": "Mathematics", "code": "MA"})),
        ("profiles", json!({"id": "admin-1", "name": "Ada Admin", "email": "ada@example.com", "role": "department_admin", "department_id": "CS-1"})),
        ("profiles", json!({"id": "orphan", "name": "No Dept", "email": "nodept@example.com", "role": "department_admin"})),
        ("profiles", json!({"id": "s-1", "name": "Bea", "email": "bea@example.com", "role": "student", "department_id": "CS-1", "student_id": "S-1"})),
        ("profiles", json!({"id": "i-1", "name": "Ivo", "email": "ivo@example.com", "role": "instructor", "department_id": "CS-1"})),
        ("courses", json!({"id": "c-1", "title": "Compilers", "department_id": "CS-1", "instructor_id": "i-1", "created_at": "2024-01-01T00:00:00.000000Z"})),
    ];
    for (collection, row) in rows {
        store
            .insert(collection, to_record(&row).unwrap())
            .await
            .unwrap();
    }

    (dir, Arc::new(store))
}

/// Gap between submissions so `created_at` values differ.
pub async fn tick() {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
}
