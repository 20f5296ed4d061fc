//! Borrow request submission and listings

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        request::{BorrowRequest, CreateBorrowRequest, RequestStatus, RequestSummary},
        user::{UserClaims, UserShort},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct RequestsService {
    repository: Repository,
}

impl RequestsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Submit a PENDING request on behalf of the token holder
    pub async fn create(
        &self,
        claims: &UserClaims,
        data: &CreateBorrowRequest,
    ) -> AppResult<(BorrowRequest, UserShort)> {
        data.validate()?;

        let equipment = match self.repository.equipment.find_by_name(&data.equipment_type).await? {
            Some(equipment) => equipment,
            None => {
                let available: Vec<String> = self
                    .repository
                    .equipment
                    .list()
                    .await?
                    .into_iter()
                    .map(|e| e.name)
                    .collect();
                return Err(AppError::Validation(format!(
                    "Invalid equipment type {}; available: {}",
                    data.equipment_type,
                    available.join(", ")
                )));
            }
        };

        let user = claims.to_user_short();
        self.repository.users.upsert(&user).await?;

        let request = self
            .repository
            .requests
            .create(&user.id, &equipment, data)
            .await?;

        tracing::info!(
            request_id = %request.id,
            equipment = %request.equipment_type,
            quantity = request.quantity,
            "Request submitted"
        );

        Ok((request, user))
    }

    /// All requests, optionally filtered by status name
    pub async fn list(&self, status: Option<&str>) -> AppResult<Vec<RequestSummary>> {
        let status = status
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<RequestStatus>())
            .transpose()
            .map_err(AppError::Validation)?;
        self.repository.requests.list(status).await
    }

    /// The caller's requests still holding units
    pub async fn list_outstanding_for_user(&self, user_id: &str) -> AppResult<Vec<BorrowRequest>> {
        self.repository.requests.list_outstanding_for_user(user_id).await
    }

    /// Users with at least one outstanding loan
    pub async fn active_borrowers(&self) -> AppResult<Vec<UserShort>> {
        self.repository.users.list_with_outstanding_loans().await
    }
}
