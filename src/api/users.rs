//! User endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::user::UserShort};

use super::AdminUser;

/// Users currently holding equipment
#[utoipa::path(
    get,
    path = "/users/active",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users with outstanding loans", body = Vec<UserShort>),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_active_borrowers(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<UserShort>>> {
    let users = state.services.requests.active_borrowers().await?;
    Ok(Json(users))
}
