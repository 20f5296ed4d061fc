//! Borrow request endpoints: submission, review and returns

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::request::{
        BorrowRequest, CreateBorrowRequest, RequestDetails, RequestQuery, RequestSummary, ReturnItem,
        ReturnPreview,
    },
    services::lending::{ApprovalOutcome, DeclineOutcome, ReturnsOutcome},
};

use super::{AdminUser, AuthenticatedUser};

/// Return batch payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReturnBatch {
    /// Lines applied in order, all or nothing
    #[serde(alias = "equipment")]
    pub items: Vec<ReturnItem>,
}

/// Query parameters for a return preview
#[derive(Debug, Deserialize, IntoParams)]
pub struct PreviewQuery {
    /// Units that would be handed back
    pub quantity: i32,
}

/// List requests, optionally filtered by status
#[utoipa::path(
    get,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(RequestQuery),
    responses(
        (status = 200, description = "Requests with owner contact", body = Vec<RequestSummary>),
        (status = 400, description = "Unknown status", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_requests(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<RequestQuery>,
) -> AppResult<Json<Vec<RequestSummary>>> {
    let requests = state.services.requests.list(query.status.as_deref()).await?;
    Ok(Json(requests))
}

/// Submit a new request
#[utoipa::path(
    post,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowRequest,
    responses(
        (status = 201, description = "Request created as PENDING", body = BorrowRequest),
        (status = 400, description = "Invalid payload or unknown equipment", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateBorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowRequest>)> {
    let (request, user) = state.services.requests.create(&claims, &data).await?;
    state.services.notifications.request_submitted(&request, &user).await;
    Ok((StatusCode::CREATED, Json(request)))
}

/// The caller's requests still holding units
#[utoipa::path(
    get,
    path = "/requests/active",
    tag = "requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Approved or partially returned requests", body = Vec<BorrowRequest>)
    )
)]
pub async fn list_my_active_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowRequest>>> {
    let requests = state
        .services
        .requests
        .list_outstanding_for_user(&claims.sub)
        .await?;
    Ok(Json(requests))
}

/// Get a request with its equipment and owner
#[utoipa::path(
    get,
    path = "/requests/{id}",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request details", body = RequestDetails),
        (status = 403, description = "Request belongs to someone else", body = crate::error::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RequestDetails>> {
    let details = state.services.lending.get_request(id).await?;
    ensure_owner_or_admin(&state, &claims.sub, &claims.email, &details.request)?;
    Ok(Json(details))
}

/// Compute the effect of a return without applying it
#[utoipa::path(
    get,
    path = "/requests/{id}/return-preview",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Request ID"), PreviewQuery),
    responses(
        (status = 200, description = "Resulting counts and status", body = ReturnPreview),
        (status = 409, description = "Request is not on loan", body = crate::error::ErrorResponse),
        (status = 422, description = "More than outstanding", body = crate::error::ErrorResponse)
    )
)]
pub async fn preview_return(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> AppResult<Json<ReturnPreview>> {
    let details = state.services.lending.get_request(id).await?;
    ensure_owner_or_admin(&state, &claims.sub, &claims.email, &details.request)?;
    let preview = state.services.lending.preview_return(id, query.quantity).await?;
    Ok(Json(preview))
}

/// Approve a pending request, reserving inventory
#[utoipa::path(
    post,
    path = "/requests/{id}/approve",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request approved", body = ApprovalOutcome),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Not pending or not enough stock", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_request(
    State(state): State<crate::AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApprovalOutcome>> {
    let outcome = state.services.lending.approve_request(id).await?;
    tracing::info!(request_id = %id, admin = %admin.email, "Approval by admin");
    state.services.notifications.request_approved(&outcome).await;
    Ok(Json(outcome))
}

/// Decline a pending request
#[utoipa::path(
    post,
    path = "/requests/{id}/decline",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request declined", body = DeclineOutcome),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn decline_request(
    State(state): State<crate::AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeclineOutcome>> {
    let outcome = state.services.lending.decline_request(id).await?;
    tracing::info!(request_id = %id, admin = %admin.email, "Decline by admin");
    state.services.notifications.request_declined(&outcome).await;
    Ok(Json(outcome))
}

/// Record a batch of returns atomically
#[utoipa::path(
    post,
    path = "/requests/return",
    tag = "requests",
    security(("bearer_auth" = [])),
    request_body = ReturnBatch,
    responses(
        (status = 200, description = "All lines applied", body = ReturnsOutcome),
        (status = 400, description = "Empty batch or non-positive quantity", body = crate::error::ErrorResponse),
        (status = 409, description = "A request is not on loan", body = crate::error::ErrorResponse),
        (status = 422, description = "A line returns more than outstanding", body = crate::error::ErrorResponse)
    )
)]
pub async fn process_returns(
    State(state): State<crate::AppState>,
    AdminUser(admin): AdminUser,
    Json(batch): Json<ReturnBatch>,
) -> AppResult<Json<ReturnsOutcome>> {
    let outcome = state.services.lending.process_returns(&batch.items).await?;
    tracing::info!(lines = outcome.results.len(), admin = %admin.email, "Returns entered by admin");
    state.services.notifications.returns_processed(&outcome).await;
    Ok(Json(outcome))
}

fn ensure_owner_or_admin(
    state: &crate::AppState,
    user_id: &str,
    email: &str,
    request: &BorrowRequest,
) -> AppResult<()> {
    if request.user_id == user_id || state.config.auth.is_admin_email(email) {
        return Ok(());
    }
    Err(AppError::Authorization("Request belongs to another user".to_string()))
}
