//! Equipment repository for database operations

use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::equipment::{normalize_name, CreateEquipment, Equipment, UpdateEquipment},
    reconciliation::ledger,
};

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

fn duplicate_name(name: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!("Equipment {} already exists", name)),
        other => other,
    }
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all equipment
    pub async fn list(&self) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Equipment>> {
        let row = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Get equipment by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Equipment> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Lookup by normalized name
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Equipment>> {
        let name = normalize_name(name)?;
        let row = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Create equipment with its whole stock available
    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let name = normalize_name(&data.name)?;
        sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (id, name, total_quantity, available_quantity, image_url)
            VALUES ($1, $2, $3, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(data.total_quantity)
        .bind(&data.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(duplicate_name(&name))
    }

    /// Update equipment; a new total is rebased against units on loan
    pub async fn update(&self, id: Uuid, data: &UpdateEquipment) -> AppResult<Equipment> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?;

        let name = match &data.name {
            Some(name) => normalize_name(name)?,
            None => current.name.clone(),
        };
        let (total, available) = match data.total_quantity {
            Some(total) => (total, ledger::rebase_total(&current, total)?),
            None => (current.total_quantity, current.available_quantity),
        };
        let image_url = data.image_url.clone().or_else(|| current.image_url.clone());

        let updated = sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment
            SET name = $2, total_quantity = $3, available_quantity = $4,
                image_url = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(total)
        .bind(available)
        .bind(&image_url)
        .fetch_one(&mut *tx)
        .await
        .map_err(duplicate_name(&name))?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete equipment and every request referencing it; returns the number of requests removed
    pub async fn delete(&self, id: Uuid) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        // Same lock order as the lending transactions: requests by id, then equipment
        sqlx::query("SELECT id FROM requests WHERE equipment_id = $1 ORDER BY id FOR UPDATE")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
        Self::lock(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?;

        let requests = sqlx::query("DELETE FROM requests WHERE equipment_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(requests)
    }

    /// Fetch and row-lock equipment inside a transaction
    pub(crate) async fn lock(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Equipment>> {
        let row = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    pub(crate) async fn set_available(
        conn: &mut PgConnection,
        id: Uuid,
        available: i32,
    ) -> AppResult<Equipment> {
        let row = sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment SET available_quantity = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(available)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?;
        Ok(row)
    }
}
