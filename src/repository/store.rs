//! Transactional store handle used by the lending operations.
//!
//! [`LendingStore`] is injected into [`crate::services::lending::LendingService`];
//! each operation opens one [`LendingTx`], locks the rows it reads, writes both
//! the request and the equipment, and commits. Dropping a `LendingTx` without
//! committing rolls everything back.

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        equipment::Equipment,
        request::{BorrowRequest, RequestStatus},
        user::UserShort,
    },
};

use super::{
    equipment::EquipmentRepository, requests::RequestsRepository, users::UsersRepository,
    Repository,
};

#[async_trait]
pub trait LendingStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn LendingTx>>;

    async fn find_request(&self, id: Uuid) -> AppResult<Option<BorrowRequest>>;

    async fn find_equipment(&self, id: Uuid) -> AppResult<Option<Equipment>>;

    async fn find_user(&self, id: &str) -> AppResult<Option<UserShort>>;

    async fn list_equipment(&self) -> AppResult<Vec<Equipment>>;
}

/// One atomic unit of work. Reads through `lock_*` hold the row until commit.
#[async_trait]
pub trait LendingTx: Send {
    async fn lock_request(&mut self, id: Uuid) -> AppResult<Option<BorrowRequest>>;

    async fn lock_equipment(&mut self, id: Uuid) -> AppResult<Option<Equipment>>;

    async fn find_user(&mut self, id: &str) -> AppResult<Option<UserShort>>;

    async fn write_request(
        &mut self,
        id: Uuid,
        status: RequestStatus,
        returned_quantity: i32,
    ) -> AppResult<BorrowRequest>;

    async fn write_available(&mut self, equipment_id: Uuid, available: i32) -> AppResult<Equipment>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Postgres transaction; read-committed plus `FOR UPDATE` row locks
pub struct PgLendingTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LendingTx for PgLendingTx {
    async fn lock_request(&mut self, id: Uuid) -> AppResult<Option<BorrowRequest>> {
        RequestsRepository::lock(&mut self.tx, id).await
    }

    async fn lock_equipment(&mut self, id: Uuid) -> AppResult<Option<Equipment>> {
        EquipmentRepository::lock(&mut self.tx, id).await
    }

    async fn find_user(&mut self, id: &str) -> AppResult<Option<UserShort>> {
        UsersRepository::fetch_short(&mut *self.tx, id).await
    }

    async fn write_request(
        &mut self,
        id: Uuid,
        status: RequestStatus,
        returned_quantity: i32,
    ) -> AppResult<BorrowRequest> {
        RequestsRepository::set_state(&mut self.tx, id, status, returned_quantity).await
    }

    async fn write_available(&mut self, equipment_id: Uuid, available: i32) -> AppResult<Equipment> {
        EquipmentRepository::set_available(&mut self.tx, equipment_id, available).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl LendingStore for Repository {
    async fn begin(&self) -> AppResult<Box<dyn LendingTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLendingTx { tx }))
    }

    async fn find_request(&self, id: Uuid) -> AppResult<Option<BorrowRequest>> {
        self.requests.find_by_id(id).await
    }

    async fn find_equipment(&self, id: Uuid) -> AppResult<Option<Equipment>> {
        self.equipment.find_by_id(id).await
    }

    async fn find_user(&self, id: &str) -> AppResult<Option<UserShort>> {
        self.users.find_short(id).await
    }

    async fn list_equipment(&self) -> AppResult<Vec<Equipment>> {
        self.equipment.list().await
    }
}
