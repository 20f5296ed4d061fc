//! Inventory overview

use axum::{extract::State, Json};

use crate::{error::AppResult, models::equipment::InventoryEntry};

/// Equipment with on-loan counts and utilization
#[utoipa::path(
    get,
    path = "/inventory",
    tag = "equipment",
    responses(
        (status = 200, description = "Inventory", body = Vec<InventoryEntry>)
    )
)]
pub async fn list_inventory(State(state): State<crate::AppState>) -> AppResult<Json<Vec<InventoryEntry>>> {
    let inventory = state.services.lending.list_inventory().await?;
    Ok(Json(inventory))
}
