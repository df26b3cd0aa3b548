//! Department directory.
//!
//! Supplies the rest of the department dashboard next to signup requests:
//! the department itself, its students and instructors, and its courses.
//! Also carries the two member-management actions of the dashboard:
//! deactivating a user and deleting a course.

use crate::error::AppError;
use crate::models::{Course, Department, UserProfile};
use crate::services::record_store::{
    from_record, to_record, Direction, Filter, RecordStore, SelectQuery,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

/// Access to department-scoped collections.
#[derive(Clone, Default)]
pub struct DepartmentDirectory {
    store: Option<Arc<dyn RecordStore>>,
}

impl DepartmentDirectory {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn from_optional(store: Option<Arc<dyn RecordStore>>) -> Self {
        Self { store }
    }

    fn store(&self) -> Result<&Arc<dyn RecordStore>, AppError> {
        self.store.as_ref().ok_or(AppError::BackendUnavailable)
    }

    async fn fetch<T: DeserializeOwned>(&self, query: SelectQuery) -> Result<Vec<T>, AppError> {
        let store = self.store()?;
        let rows = store.select(&query).await?;
        rows.into_iter()
            .map(|row| from_record(row).map_err(AppError::from))
            .collect()
    }

    /// Look up a department by id.
    pub async fn department(&self, department_id: &str) -> Result<Option<Department>, AppError> {
        let query = SelectQuery::from("departments")
            .eq("id", department_id)
            .limit(1);
        Ok(self.fetch(query).await?.into_iter().next())
    }

    /// Department an admin's profile is attached to, if any.
    pub async fn admin_department(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let query = SelectQuery::from("profiles").eq("id", user_id).limit(1);
        let profile: Option<UserProfile> = self.fetch(query).await?.into_iter().next();
        Ok(profile.and_then(|p| p.department_id))
    }

    /// All profiles in a department, ordered by name.
    pub async fn users(&self, department_id: &str) -> Result<Vec<UserProfile>, AppError> {
        let query = SelectQuery::from("profiles")
            .eq("department_id", department_id)
            .order_by("name", Direction::Ascending);
        self.fetch(query).await
    }

    /// Courses in a department, newest first.
    pub async fn courses(&self, department_id: &str) -> Result<Vec<Course>, AppError> {
        let query = SelectQuery::from("courses")
            .eq("department_id", department_id)
            .order_by("created_at", Direction::Descending);
        self.fetch(query).await
    }

    /// Mark a department member inactive. The profile row is kept.
    pub async fn deactivate_user(
        &self,
        department_id: &str,
        user_id: &str,
    ) -> Result<(), AppError> {
        let store = self.store()?;
        let patch = to_record(&json!({ "is_active": false }))?;
        let changed = store
            .update(
                "profiles",
                &[
                    Filter::eq("id", user_id),
                    Filter::eq("department_id", department_id),
                ],
                patch,
            )
            .await
            .map_err(|e| {
                log::error!("[directory] Error deactivating user {}: {}", user_id, e);
                AppError::from(e)
            })?;

        if changed == 0 {
            return Err(AppError::not_found_with_id("User", user_id));
        }
        log::info!("[directory] Deactivated user {}", user_id);
        Ok(())
    }

    /// Delete a course owned by the department.
    pub async fn delete_course(
        &self,
        department_id: &str,
        course_id: &str,
    ) -> Result<(), AppError> {
        let store = self.store()?;
        let removed = store
            .delete(
                "courses",
                &[
                    Filter::eq("id", course_id),
                    Filter::eq("department_id", department_id),
                ],
            )
            .await
            .map_err(|e| {
                log::error!("[directory] Error deleting course {}: {}", course_id, e);
                AppError::from(e)
            })?;

        if removed == 0 {
            return Err(AppError::not_found_with_id("Course", course_id));
        }
        log::info!("[directory] Deleted course {}", course_id);
        Ok(())
    }
}
