//! Department dashboard controller for reviewing signup requests.
//!
//! Holds the locally cached dashboard data, the approval dialog state, and
//! a queue of notifications for the operator. Every successful mutation is
//! followed by a full reload rather than a local patch, and nothing is
//! changed locally before the store confirms.
//!
//! ```text
//! Closed --begin_approval(pending)--> Open { credential }
//! Open   --confirm_approval--> approve, reload --> Closed
//! Open   --cancel_approval--> Closed
//! reject(pending) --> reject, reload
//! ```

use crate::error::AppError;
use crate::models::{Course, Department, SignupRequest, UserProfile, UserRole};
use crate::services::credentials::{generate_temporary_credential, validate_temporary_credential};
use crate::services::directory::DepartmentDirectory;
use crate::services::signup_requests::SignupRequestManager;
use serde::Serialize;

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Success,
    Error,
}

/// A transient message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: Option<String>,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
            variant: NotificationVariant::Success,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
            variant: NotificationVariant::Error,
        }
    }
}

/// What a super admin needs to create the approved student's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningNotice {
    pub request_id: String,
    pub name: String,
    pub email: String,
    pub temporary_password: String,
}

impl ProvisioningNotice {
    pub fn message(&self) -> String {
        format!(
            "Signup request approved. Note: A super admin must create the account with email: {} and password: {}",
            self.email, self.temporary_password
        )
    }
}

/// Approval dialog state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ApprovalDialog {
    #[default]
    Closed,
    Open {
        request: SignupRequest,
        credential: String,
    },
}

/// Everything the dashboard shows for one department.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub department: Option<Department>,
    pub requests: Vec<SignupRequest>,
    pub students: Vec<UserProfile>,
    pub instructors: Vec<UserProfile>,
    pub courses: Vec<Course>,
}

impl DashboardData {
    pub fn pending_count(&self) -> usize {
        self.requests.iter().filter(|r| r.is_pending()).count()
    }
}

/// Signup review controller for one reviewer.
pub struct ApprovalWorkflow {
    gateway: SignupRequestManager,
    directory: DepartmentDirectory,
    reviewer_id: String,
    department_id: Option<String>,
    data: DashboardData,
    dialog: ApprovalDialog,
    notifications: Vec<Notification>,
}

impl ApprovalWorkflow {
    pub fn new(
        gateway: SignupRequestManager,
        directory: DepartmentDirectory,
        reviewer_id: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            directory,
            reviewer_id: reviewer_id.into(),
            department_id: None,
            data: DashboardData::default(),
            dialog: ApprovalDialog::Closed,
            notifications: Vec::new(),
        }
    }

    /// Skip resolving the reviewer's department from their profile.
    pub fn for_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    pub fn reviewer_id(&self) -> &str {
        &self.reviewer_id
    }

    pub fn department_id(&self) -> Option<&str> {
        self.department_id.as_deref()
    }

    pub fn data(&self) -> &DashboardData {
        &self.data
    }

    pub fn dialog(&self) -> &ApprovalDialog {
        &self.dialog
    }

    pub fn selected(&self) -> Option<&SignupRequest> {
        match &self.dialog {
            ApprovalDialog::Open { request, .. } => Some(request),
            ApprovalDialog::Closed => None,
        }
    }

    pub fn credential(&self) -> Option<&str> {
        match &self.dialog {
            ApprovalDialog::Open { credential, .. } => Some(credential),
            ApprovalDialog::Closed => None,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.data.pending_count()
    }

    /// Drain queued notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Only pending requests offer approve and reject.
    pub fn is_actionable(request: &SignupRequest) -> bool {
        request.is_pending()
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    /// Reload requests, people, and courses for the reviewer's department.
    ///
    /// Returns `false` (with a notification queued) when nothing could be loaded.
    pub async fn load(&mut self) -> bool {
        let department_id = match self.resolve_department().await {
            Some(id) => id,
            None => return false,
        };

        let (requests, listings) = futures::join!(
            self.gateway.list(Some(&department_id)),
            async {
                futures::try_join!(
                    self.directory.department(&department_id),
                    self.directory.users(&department_id),
                    self.directory.courses(&department_id),
                )
            }
        );

        match listings {
            Ok((department, users, courses)) => {
                let (students, instructors) = split_by_role(users);
                self.data = DashboardData {
                    department,
                    requests,
                    students,
                    instructors,
                    courses,
                };
                true
            }
            Err(e) => {
                log::error!("[dashboard] Failed to load data: {}", e);
                self.notify(Notification::error("Error", "Failed to load dashboard data"));
                false
            }
        }
    }

    async fn resolve_department(&mut self) -> Option<String> {
        if let Some(id) = &self.department_id {
            return Some(id.clone());
        }

        match self.directory.admin_department(&self.reviewer_id).await {
            Ok(Some(id)) => {
                self.department_id = Some(id.clone());
                Some(id)
            }
            Ok(None) => {
                log::error!(
                    "[dashboard] Reviewer {} has no department on their profile",
                    self.reviewer_id
                );
                self.notify(Notification::error(
                    "Department Not Found",
                    "Your account is not linked to a department. Contact an administrator.",
                ));
                None
            }
            Err(e) => {
                log::error!("[dashboard] Failed to resolve department: {}", e);
                self.notify(Notification::error("Error", "Failed to load dashboard data"));
                None
            }
        }
    }

    /// Open the approval dialog for a pending request with a fresh credential.
    pub fn begin_approval(&mut self, request_id: &str) -> bool {
        let Some(request) = self.data.requests.iter().find(|r| r.id == request_id) else {
            log::warn!("[dashboard] Request {} is not loaded", request_id);
            return false;
        };
        if !Self::is_actionable(request) {
            log::debug!(
                "[dashboard] Request {} is already {}",
                request_id,
                request.status
            );
            return false;
        }

        self.dialog = ApprovalDialog::Open {
            request: request.clone(),
            credential: generate_temporary_credential(),
        };
        true
    }

    /// Replace the generated credential with one typed by the operator.
    pub fn set_credential(&mut self, value: impl Into<String>) -> bool {
        match &mut self.dialog {
            ApprovalDialog::Open { credential, .. } => {
                *credential = value.into();
                true
            }
            ApprovalDialog::Closed => false,
        }
    }

    /// Close the dialog without touching the store.
    pub fn cancel_approval(&mut self) {
        self.dialog = ApprovalDialog::Closed;
    }

    /// Approve the selected request.
    ///
    /// On success the dialog closes, the dashboard reloads, and the returned
    /// notice carries the credential to relay. On failure the dialog stays open.
    pub async fn confirm_approval(&mut self) -> Option<ProvisioningNotice> {
        let ApprovalDialog::Open {
            request,
            credential,
        } = &self.dialog
        else {
            return None;
        };
        let request = request.clone();
        let credential = match validate_temporary_credential(credential) {
            Ok(credential) => credential,
            Err(e) => {
                self.notify(Notification::error("Error", e.to_string()));
                return None;
            }
        };

        let result = self
            .gateway
            .approve(&request.id, &self.reviewer_id, &credential)
            .await;

        match result {
            Ok(()) => {
                let notice = ProvisioningNotice {
                    request_id: request.id,
                    name: request.name,
                    email: request.email,
                    temporary_password: credential,
                };
                self.notify(Notification::success(
                    "Request Approved",
                    Some(notice.message()),
                ));
                self.dialog = ApprovalDialog::Closed;
                self.load().await;
                Some(notice)
            }
            Err(e) => {
                let description = failure_description(&e, "Failed to approve request");
                self.notify(Notification::error("Error", description));
                None
            }
        }
    }

    /// Reject a request directly; there is no dialog step.
    pub async fn reject(&mut self, request_id: &str) -> bool {
        if let Some(cached) = self.data.requests.iter().find(|r| r.id == request_id) {
            if !Self::is_actionable(cached) {
                log::debug!(
                    "[dashboard] Request {} is already {}",
                    request_id,
                    cached.status
                );
                return false;
            }
        }

        match self.gateway.reject(request_id, &self.reviewer_id).await {
            Ok(()) => {
                if self.selected().is_some_and(|r| r.id == request_id) {
                    self.dialog = ApprovalDialog::Closed;
                }
                self.notify(Notification::success("Request Rejected", None));
                self.load().await;
                true
            }
            Err(e) => {
                let description = failure_description(&e, "Failed to reject request");
                self.notify(Notification::error("Error", description));
                false
            }
        }
    }

    /// Deactivate a member of the reviewer's department, then reload.
    pub async fn deactivate_user(&mut self, user_id: &str) -> bool {
        let Some(department_id) = self.resolve_department().await else {
            return false;
        };

        match self.directory.deactivate_user(&department_id, user_id).await {
            Ok(()) => {
                self.notify(Notification::success(
                    "User deactivated",
                    Some("User has been deactivated successfully".to_string()),
                ));
                self.load().await;
                true
            }
            Err(e) => {
                log::error!("[dashboard] Failed to deactivate user {}: {}", user_id, e);
                self.notify(Notification::error("Error", "Failed to deactivate user"));
                false
            }
        }
    }

    /// Delete a course of the reviewer's department, then reload.
    pub async fn delete_course(&mut self, course_id: &str) -> bool {
        let Some(department_id) = self.resolve_department().await else {
            return false;
        };

        match self.directory.delete_course(&department_id, course_id).await {
            Ok(()) => {
                self.notify(Notification::success("Course deleted successfully", None));
                self.load().await;
                true
            }
            Err(e) => {
                log::error!("[dashboard] Failed to delete course {}: {}", course_id, e);
                self.notify(Notification::error("Error", "Failed to delete course"));
                false
            }
        }
    }
}

fn split_by_role(users: Vec<UserProfile>) -> (Vec<UserProfile>, Vec<UserProfile>) {
    let mut students = Vec::new();
    let mut instructors = Vec::new();
    for user in users {
        match user.role {
            UserRole::Student => students.push(user),
            UserRole::Instructor => instructors.push(user),
            UserRole::DepartmentAdmin | UserRole::SuperAdmin => {}
        }
    }
    (students, instructors)
}

fn failure_description(err: &AppError, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
