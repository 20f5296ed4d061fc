//! In-memory [`LendingStore`] for tests.
//!
//! A transaction holds the single table lock for its whole lifetime, so
//! transactions are fully serialized. The tables are snapshotted at `begin`
//! and restored if the transaction is dropped without commit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::Equipment,
        request::{BorrowRequest, RequestStatus},
        user::UserShort,
    },
};

use super::store::{LendingStore, LendingTx};

#[derive(Debug, Clone, Default)]
struct Tables {
    equipment: HashMap<Uuid, Equipment>,
    requests: HashMap<Uuid, BorrowRequest>,
    users: HashMap<String, UserShort>,
}

/// A row lock taken through [`LendingTx`], in acquisition order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockedRow {
    Request(Uuid),
    Equipment(Uuid),
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    locks: Arc<StdMutex<Vec<LockedRow>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_equipment(&self, name: &str, total: i32, available: i32) -> Equipment {
        let now = Utc::now();
        let equipment = Equipment {
            id: Uuid::new_v4(),
            name: name.to_uppercase(),
            total_quantity: total,
            available_quantity: available,
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .await
            .equipment
            .insert(equipment.id, equipment.clone());
        equipment
    }

    pub async fn add_user(&self, id: &str, email: &str) -> UserShort {
        let user = UserShort {
            id: id.to_string(),
            name: id.to_string(),
            email: email.to_string(),
        };
        self.tables
            .lock()
            .await
            .users
            .insert(user.id.clone(), user.clone());
        user
    }

    /// Insert a request row as-is; callers choose the starting status
    pub async fn add_request(
        &self,
        user_id: &str,
        equipment: &Equipment,
        quantity: i32,
        returned_quantity: i32,
        status: RequestStatus,
    ) -> BorrowRequest {
        let now = Utc::now();
        let request = BorrowRequest {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            equipment_id: equipment.id,
            equipment_type: equipment.name.clone(),
            quantity,
            returned_quantity,
            status,
            purpose: "Testing".to_string(),
            campus: "Main".to_string(),
            pickup_date: now,
            return_date: now + Duration::days(7),
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .await
            .requests
            .insert(request.id, request.clone());
        request
    }

    pub async fn equipment(&self, id: Uuid) -> Option<Equipment> {
        self.tables.lock().await.equipment.get(&id).cloned()
    }

    pub async fn request(&self, id: Uuid) -> Option<BorrowRequest> {
        self.tables.lock().await.requests.get(&id).cloned()
    }

    pub async fn requests(&self) -> Vec<BorrowRequest> {
        self.tables.lock().await.requests.values().cloned().collect()
    }

    /// Every row lock taken so far, committed or not
    pub fn lock_log(&self) -> Vec<LockedRow> {
        self.locks.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

pub struct MemoryTx {
    tables: OwnedMutexGuard<Tables>,
    snapshot: Option<Tables>,
    locks: Arc<StdMutex<Vec<LockedRow>>>,
}

impl MemoryTx {
    fn record(&self, row: LockedRow) {
        if let Ok(mut log) = self.locks.lock() {
            log.push(row);
        }
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.tables = snapshot;
        }
    }
}

#[async_trait]
impl LendingTx for MemoryTx {
    async fn lock_request(&mut self, id: Uuid) -> AppResult<Option<BorrowRequest>> {
        self.record(LockedRow::Request(id));
        Ok(self.tables.requests.get(&id).cloned())
    }

    async fn lock_equipment(&mut self, id: Uuid) -> AppResult<Option<Equipment>> {
        self.record(LockedRow::Equipment(id));
        Ok(self.tables.equipment.get(&id).cloned())
    }

    async fn find_user(&mut self, id: &str) -> AppResult<Option<UserShort>> {
        Ok(self.tables.users.get(id).cloned())
    }

    async fn write_request(
        &mut self,
        id: Uuid,
        status: RequestStatus,
        returned_quantity: i32,
    ) -> AppResult<BorrowRequest> {
        let request = self
            .tables
            .requests
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;
        request.status = status;
        request.returned_quantity = returned_quantity;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn write_available(&mut self, equipment_id: Uuid, available: i32) -> AppResult<Equipment> {
        let equipment = self
            .tables
            .equipment
            .get_mut(&equipment_id)
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", equipment_id)))?;
        equipment.available_quantity = available;
        equipment.updated_at = Utc::now();
        Ok(equipment.clone())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let mut tx = self;
        tx.snapshot = None;
        Ok(())
    }
}

#[async_trait]
impl LendingStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn LendingTx>> {
        let tables = self.tables.clone().lock_owned().await;
        let snapshot = Some(tables.clone());
        Ok(Box::new(MemoryTx {
            tables,
            snapshot,
            locks: self.locks.clone(),
        }))
    }

    async fn find_request(&self, id: Uuid) -> AppResult<Option<BorrowRequest>> {
        Ok(self.request(id).await)
    }

    async fn find_equipment(&self, id: Uuid) -> AppResult<Option<Equipment>> {
        Ok(self.equipment(id).await)
    }

    async fn find_user(&self, id: &str) -> AppResult<Option<UserShort>> {
        Ok(self.tables.lock().await.users.get(id).cloned())
    }

    async fn list_equipment(&self) -> AppResult<Vec<Equipment>> {
        let mut rows: Vec<Equipment> = self.tables.lock().await.equipment.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() {
        let store = MemoryStore::new();
        let e = store.add_equipment("tripod", 5, 5).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.write_available(e.id, 1).await.unwrap();
        }
        assert_eq!(store.equipment(e.id).await.unwrap().available_quantity, 5);

        let mut tx = store.begin().await.unwrap();
        tx.write_available(e.id, 2).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.equipment(e.id).await.unwrap().available_quantity, 2);
    }
}
