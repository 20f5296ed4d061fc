//! Users repository for database operations

use sqlx::{PgExecutor, Pool, Postgres};

use crate::{
    error::AppResult,
    models::user::{User, UserShort},
};

use super::requests::outstanding_statuses;

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert the user or refresh their name and email
    pub async fn upsert(&self, user: &UserShort) -> AppResult<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email
            RETURNING *
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_short(&self, id: &str) -> AppResult<Option<UserShort>> {
        Self::fetch_short(&self.pool, id).await
    }

    pub(crate) async fn fetch_short<'c, E>(executor: E, id: &str) -> AppResult<Option<UserShort>>
    where
        E: PgExecutor<'c>,
    {
        let row = sqlx::query_as::<_, UserShort>("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Users holding at least one outstanding loan
    pub async fn list_with_outstanding_loans(&self) -> AppResult<Vec<UserShort>> {
        let rows = sqlx::query_as::<_, UserShort>(
            r#"
            SELECT u.id, u.name, u.email
            FROM users u
            WHERE EXISTS (
                SELECT 1 FROM requests r
                WHERE r.user_id = u.id AND r.status = ANY($1)
            )
            ORDER BY u.name
            "#,
        )
        .bind(outstanding_statuses())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
