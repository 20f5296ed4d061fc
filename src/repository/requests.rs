//! Borrow requests repository for database operations

use sqlx::{FromRow, PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::Equipment,
        request::{BorrowRequest, CreateBorrowRequest, RequestStatus, RequestSummary},
        user::UserShort,
    },
};

/// Request joined with its owner's contact columns
#[derive(FromRow)]
struct RequestSummaryRow {
    #[sqlx(flatten)]
    request: BorrowRequest,
    user_name: Option<String>,
    user_email: Option<String>,
}

impl From<RequestSummaryRow> for RequestSummary {
    fn from(row: RequestSummaryRow) -> Self {
        let user = match (row.user_name, row.user_email) {
            (Some(name), Some(email)) => Some(UserShort {
                id: row.request.user_id.clone(),
                name,
                email,
            }),
            _ => None,
        };
        RequestSummary {
            request: row.request,
            user,
        }
    }
}

#[derive(Clone)]
pub struct RequestsRepository {
    pool: Pool<Postgres>,
}

impl RequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<BorrowRequest>> {
        let row = sqlx::query_as::<_, BorrowRequest>("SELECT * FROM requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Insert a PENDING request against `equipment`
    pub async fn create(
        &self,
        user_id: &str,
        equipment: &Equipment,
        data: &CreateBorrowRequest,
    ) -> AppResult<BorrowRequest> {
        let row = sqlx::query_as::<_, BorrowRequest>(
            r#"
            INSERT INTO requests (
                id, user_id, equipment_id, equipment_type, quantity, returned_quantity,
                status, purpose, campus, pickup_date, return_date
            )
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(equipment.id)
        .bind(&equipment.name)
        .bind(data.quantity)
        .bind(RequestStatus::Pending)
        .bind(data.purpose.trim())
        .bind(data.campus.trim())
        .bind(data.pickup_date)
        .bind(data.return_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// List requests with owner contact, newest first
    pub async fn list(&self, status: Option<RequestStatus>) -> AppResult<Vec<RequestSummary>> {
        let rows = sqlx::query_as::<_, RequestSummaryRow>(
            r#"
            SELECT r.*, u.name AS user_name, u.email AS user_email
            FROM requests r
            LEFT JOIN users u ON u.id = r.user_id
            WHERE ($1::text IS NULL OR r.status = $1)
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Requests of `user_id` still holding units
    pub async fn list_outstanding_for_user(&self, user_id: &str) -> AppResult<Vec<BorrowRequest>> {
        let rows = sqlx::query_as::<_, BorrowRequest>(
            r#"
            SELECT * FROM requests
            WHERE user_id = $1 AND status = ANY($2)
            ORDER BY pickup_date DESC
            "#,
        )
        .bind(user_id)
        .bind(outstanding_statuses())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Fetch and row-lock a request inside a transaction
    pub(crate) async fn lock(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<BorrowRequest>> {
        let row = sqlx::query_as::<_, BorrowRequest>("SELECT * FROM requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    pub(crate) async fn set_state(
        conn: &mut PgConnection,
        id: Uuid,
        status: RequestStatus,
        returned_quantity: i32,
    ) -> AppResult<BorrowRequest> {
        let row = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE requests SET status = $2, returned_quantity = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(returned_quantity)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;
        Ok(row)
    }
}

pub(crate) fn outstanding_statuses() -> Vec<&'static str> {
    RequestStatus::OUTSTANDING.iter().map(|s| s.as_str()).collect()
}
