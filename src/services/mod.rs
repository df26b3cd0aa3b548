//! Business logic services.
//!
//! The record store trait and its two backends sit at the bottom; the
//! signup request gateway and department directory read and write through
//! them; the approval workflow and the HTTP API sit on top.
//!
//! Services hold no global state and can be tested against a temporary
//! SQLite store.

pub mod approval_workflow;
pub mod credentials;
pub mod directory;
pub mod http_api;
pub mod http_server;
pub mod record_store;
pub mod rest_store;
pub mod signup_requests;
pub mod sqlite_store;

pub use approval_workflow::{ApprovalWorkflow, Notification, ProvisioningNotice};
pub use directory::DepartmentDirectory;
pub use record_store::RecordStore;
pub use rest_store::{RestRecordStore, RestStoreConfig};
pub use signup_requests::{SignupRequestManager, TransitionGuard};
pub use sqlite_store::SqliteRecordStore;
