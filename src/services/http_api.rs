//! REST API routes for signup requests.
//!
//! Submission is open to prospective students; review endpoints take the
//! reviewer id in the body. Authentication happens in front of this service.

use crate::error::{AppError, OperationResult};
use crate::models::{NewSignupRequest, SignupRequest};
use crate::services::approval_workflow::ProvisioningNotice;
use crate::services::credentials::{generate_temporary_credential, validate_temporary_credential};
use crate::services::signup_requests::SignupRequestManager;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

/// Shared state for the API routes.
#[derive(Clone)]
pub struct ApiState {
    pub requests: SignupRequestManager,
}

impl ApiState {
    pub fn new(requests: SignupRequestManager) -> Self {
        Self { requests }
    }
}

// ── Error handling ───────────────────────────────────────────────────────────

/// JSON body for failed calls: the `{success, error}` shape plus a stable code.
#[derive(Serialize)]
struct ApiError {
    success: bool,
    code: &'static str,
    error: String,
}

/// Wrapper to make AppError usable as an axum error response.
struct ApiErr(AppError);

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            AppError::BackendUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "BACKEND_UNAVAILABLE"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Remote { .. } => (StatusCode::BAD_GATEWAY, "REMOTE_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        (
            status,
            Json(ApiError {
                success: false,
                code,
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

// ── Request / response types ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    department_id: Option<String>,
}

/// Body of the approve endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveInput {
    pub reviewer_id: String,
    /// Generated server-side when omitted or blank.
    #[serde(default)]
    pub temporary_password: Option<String>,
}

/// Body of the reject endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectInput {
    pub reviewer_id: String,
}

#[derive(Serialize)]
struct ApproveResponse {
    success: bool,
    notice: ProvisioningNotice,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    store_configured: bool,
}

fn require_reviewer(reviewer_id: &str) -> Result<&str, AppError> {
    let reviewer_id = reviewer_id.trim();
    if reviewer_id.is_empty() {
        return Err(AppError::invalid_input_field(
            "Reviewer is required",
            "reviewerId",
        ));
    }
    Ok(reviewer_id)
}

// ── Route builder ────────────────────────────────────────────────────────────

/// Build the signup request API routes.
pub fn api_routes() -> Router<ApiState> {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/signup-requests",
            get(list_requests).post(submit_request),
        )
        .route("/api/signup-requests/{id}", get(get_request))
        .route("/api/signup-requests/{id}/approve", post(approve_request))
        .route("/api/signup-requests/{id}/reject", post(reject_request))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/health: liveness and whether a store is configured.
async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        store_configured: state.requests.is_configured(),
    })
}

/// POST /api/signup-requests: submit a new request.
async fn submit_request(
    State(state): State<ApiState>,
    Json(input): Json<NewSignupRequest>,
) -> Result<(StatusCode, Json<OperationResult>), ApiErr> {
    state.requests.submit(input).await?;
    Ok((StatusCode::CREATED, Json(OperationResult::ok())))
}

/// GET /api/signup-requests?department_id=X: newest first.
///
/// Always 200: a failed fetch reads as an empty list.
async fn list_requests(
    State(state): State<ApiState>,
    Query(params): Query<ListQuery>,
) -> Json<Vec<SignupRequest>> {
    Json(state.requests.list(params.department_id.as_deref()).await)
}

/// GET /api/signup-requests/{id}: one request.
async fn get_request(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<SignupRequest>, ApiErr> {
    Ok(Json(state.requests.get(&id).await?))
}

/// POST /api/signup-requests/{id}/approve: approve and return the provisioning notice.
async fn approve_request(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(input): Json<ApproveInput>,
) -> Result<Json<ApproveResponse>, ApiErr> {
    let reviewer_id = require_reviewer(&input.reviewer_id)?;
    let credential = match input.temporary_password.filter(|p| !p.trim().is_empty()) {
        Some(password) => validate_temporary_credential(&password)?,
        None => generate_temporary_credential(),
    };

    let request = state.requests.get(&id).await?;
    state.requests.approve(&id, reviewer_id, &credential).await?;

    Ok(Json(ApproveResponse {
        success: true,
        notice: ProvisioningNotice {
            request_id: request.id,
            name: request.name,
            email: request.email,
            temporary_password: credential,
        },
    }))
}

/// POST /api/signup-requests/{id}/reject: reject.
async fn reject_request(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(input): Json<RejectInput>,
) -> Result<Json<OperationResult>, ApiErr> {
    let reviewer_id = require_reviewer(&input.reviewer_id)?;
    state.requests.reject(&id, reviewer_id).await?;
    Ok(Json(OperationResult::ok()))
}
