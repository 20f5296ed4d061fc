//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{equipment, health, inventory, requests, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Equipment Lending API",
        version = "1.0.0",
        description = "Equipment request, approval and return REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Equipment
        inventory::list_inventory,
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        // Requests
        requests::list_requests,
        requests::create_request,
        requests::list_my_active_requests,
        requests::get_request,
        requests::preview_return,
        requests::approve_request,
        requests::decline_request,
        requests::process_returns,
        // Users
        users::list_active_borrowers,
    ),
    components(
        schemas(
            // Equipment
            crate::models::equipment::Equipment,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            crate::models::equipment::InventoryEntry,
            // Requests
            crate::models::request::RequestStatus,
            crate::models::request::BorrowRequest,
            crate::models::request::CreateBorrowRequest,
            crate::models::request::ReturnItem,
            crate::models::request::RequestSummary,
            crate::models::request::RequestDetails,
            crate::models::request::ReturnPreview,
            requests::ReturnBatch,
            crate::services::lending::ApprovalOutcome,
            crate::services::lending::DeclineOutcome,
            crate::services::lending::ReturnItemResult,
            crate::services::lending::ReturnsOutcome,
            // Users
            crate::models::user::User,
            crate::models::user::UserShort,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "equipment", description = "Equipment and inventory"),
        (name = "requests", description = "Borrow requests, approvals and returns"),
        (name = "users", description = "Borrowers")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
