//! Lending service: approve, decline and return, each as one transaction.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::{Equipment, InventoryEntry},
        request::{BorrowRequest, RequestDetails, ReturnItem, ReturnPreview},
        user::UserShort,
    },
    reconciliation::{state_machine, Transition},
    repository::{LendingStore, LendingTx},
};

/// Approved request with the equipment row it drew from
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    pub request: BorrowRequest,
    pub equipment: Equipment,
    pub user: Option<UserShort>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeclineOutcome {
    pub request: BorrowRequest,
    pub user: Option<UserShort>,
}

/// Effect of one line of a return batch
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItemResult {
    pub returned_now: i32,
    pub request: BorrowRequest,
    pub equipment: Equipment,
    pub user: Option<UserShort>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnsOutcome {
    pub results: Vec<ReturnItemResult>,
}

#[derive(Clone)]
pub struct LendingService {
    store: Arc<dyn LendingStore>,
}

impl LendingService {
    pub fn new(store: Arc<dyn LendingStore>) -> Self {
        Self { store }
    }

    /// PENDING → APPROVED, reserving the requested units
    #[tracing::instrument(skip(self))]
    pub async fn approve_request(&self, request_id: Uuid) -> AppResult<ApprovalOutcome> {
        let mut tx = self.store.begin().await?;

        // Request before equipment, matching process_returns
        let request = lock_request(tx.as_mut(), request_id).await?;
        let equipment = lock_equipment(tx.as_mut(), request.equipment_id).await?;
        let transition = state_machine::approve(&request, &equipment)?;
        let (request, equipment) = persist(tx.as_mut(), &request, &equipment, &transition).await?;
        let user = tx.find_user(&request.user_id).await?;

        tx.commit().await?;

        tracing::info!(
            equipment = %equipment.name,
            quantity = request.quantity,
            available = equipment.available_quantity,
            "Request approved"
        );

        Ok(ApprovalOutcome {
            request,
            equipment,
            user,
        })
    }

    /// PENDING → DECLINED; inventory untouched
    #[tracing::instrument(skip(self))]
    pub async fn decline_request(&self, request_id: Uuid) -> AppResult<DeclineOutcome> {
        let mut tx = self.store.begin().await?;

        let request = lock_request(tx.as_mut(), request_id).await?;
        let transition = state_machine::decline(&request)?;
        let request = tx
            .write_request(request.id, transition.to, transition.returned_quantity)
            .await?;
        let user = tx.find_user(&request.user_id).await?;

        tx.commit().await?;

        tracing::info!(equipment = %request.equipment_type, "Request declined");

        Ok(DeclineOutcome { request, user })
    }

    /// Record a batch of returns; any failing line aborts the whole batch
    #[tracing::instrument(skip(self, items), fields(items = items.len()))]
    pub async fn process_returns(&self, items: &[ReturnItem]) -> AppResult<ReturnsOutcome> {
        if items.is_empty() {
            return Err(AppError::Validation("No items to return".to_string()));
        }

        let mut tx = self.store.begin().await?;

        // Lock order: requests by id, then equipment by id
        let mut request_ids: Vec<Uuid> = items.iter().map(|item| item.request_id).collect();
        request_ids.sort_unstable();
        request_ids.dedup();

        let mut requests = HashMap::with_capacity(request_ids.len());
        for id in request_ids {
            requests.insert(id, lock_request(tx.as_mut(), id).await?);
        }

        let mut equipment_ids: Vec<Uuid> = requests.values().map(|r| r.equipment_id).collect();
        equipment_ids.sort_unstable();
        equipment_ids.dedup();

        let mut equipment = HashMap::with_capacity(equipment_ids.len());
        for id in equipment_ids {
            equipment.insert(id, lock_equipment(tx.as_mut(), id).await?);
        }

        let mut results = Vec::with_capacity(items.len());

        for item in items {
            let request = locked(&requests, item.request_id)?;
            let transition = state_machine::record_return(&request, item.returned_now)?;
            let current = locked(&equipment, request.equipment_id)?;
            let (request, current) = persist(tx.as_mut(), &request, &current, &transition).await?;
            let user = tx.find_user(&request.user_id).await?;

            tracing::debug!(
                request_id = %request.id,
                returned_now = item.returned_now,
                status = %request.status,
                "Return recorded"
            );

            requests.insert(request.id, request.clone());
            equipment.insert(current.id, current.clone());

            results.push(ReturnItemResult {
                returned_now: item.returned_now,
                request,
                equipment: current,
                user,
            });
        }

        tx.commit().await?;

        tracing::info!(count = results.len(), "Returns processed");

        Ok(ReturnsOutcome { results })
    }

    /// Request with remaining quantity, equipment and owner
    pub async fn get_request(&self, request_id: Uuid) -> AppResult<RequestDetails> {
        let request = self
            .store
            .find_request(request_id)
            .await?
            .ok_or_else(|| not_found(request_id))?;
        let equipment = self.store.find_equipment(request.equipment_id).await?;
        let user = self.store.find_user(&request.user_id).await?;

        Ok(RequestDetails {
            remaining_quantity: request.remaining_quantity(),
            request,
            equipment,
            user,
        })
    }

    /// All equipment with on-loan counts and utilization
    pub async fn list_inventory(&self) -> AppResult<Vec<InventoryEntry>> {
        let equipment = self.store.list_equipment().await?;
        Ok(equipment.into_iter().map(InventoryEntry::from).collect())
    }

    /// What a return of `returned_now` units would do, without writing anything
    pub async fn preview_return(&self, request_id: Uuid, returned_now: i32) -> AppResult<ReturnPreview> {
        let request = self
            .store
            .find_request(request_id)
            .await?
            .ok_or_else(|| not_found(request_id))?;
        let transition = state_machine::record_return(&request, returned_now)?;

        Ok(ReturnPreview {
            request_id,
            returned_now,
            returned_quantity: transition.returned_quantity,
            remaining_quantity: request.quantity - transition.returned_quantity,
            status: transition.to,
        })
    }
}

fn not_found(request_id: Uuid) -> AppError {
    AppError::NotFound(format!("Request {} not found", request_id))
}

async fn lock_request(tx: &mut dyn LendingTx, request_id: Uuid) -> AppResult<BorrowRequest> {
    tx.lock_request(request_id)
        .await?
        .ok_or_else(|| not_found(request_id))
}

async fn lock_equipment(tx: &mut dyn LendingTx, equipment_id: Uuid) -> AppResult<Equipment> {
    tx.lock_equipment(equipment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", equipment_id)))
}

/// Row already locked earlier in this transaction
fn locked<T: Clone>(rows: &HashMap<Uuid, T>, id: Uuid) -> AppResult<T> {
    rows.get(&id)
        .cloned()
        .ok_or_else(|| AppError::Internal(format!("Row {} was not locked", id)))
}

/// Write the transition and its ledger entry
async fn persist(
    tx: &mut dyn LendingTx,
    request: &BorrowRequest,
    equipment: &Equipment,
    transition: &Transition,
) -> AppResult<(BorrowRequest, Equipment)> {
    let available = transition.ledger.post(equipment)?;

    let request = tx
        .write_request(request.id, transition.to, transition.returned_quantity)
        .await?;
    let equipment = if transition.ledger.is_empty() {
        equipment.clone()
    } else {
        tx.write_available(equipment.id, available).await?
    };

    Ok((request, equipment))
}
