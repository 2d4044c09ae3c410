//! Deliverer repository.

use perim_core::DelivererId;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::Deliverer;

/// Repository for deliverer database operations.
pub struct DelivererRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DelivererRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List deliverers by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Deliverer>, RepositoryError> {
        let deliverers = sqlx::query_as::<_, Deliverer>(
            r"
            SELECT id, name, created_at, updated_at
            FROM deliverer
            ORDER BY name, id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(deliverers)
    }

    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM deliverer")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: DelivererId) -> Result<Option<Deliverer>, RepositoryError> {
        let deliverer = sqlx::query_as::<_, Deliverer>(
            "SELECT id, name, created_at, updated_at FROM deliverer WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(deliverer)
    }

    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn create(&self, name: &str) -> Result<Deliverer, RepositoryError> {
        let deliverer = sqlx::query_as::<_, Deliverer>(
            "INSERT INTO deliverer (name) VALUES ($1) RETURNING id, name, created_at, updated_at",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(deliverer)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the deliverer doesn't exist.
    pub async fn update(&self, id: DelivererId, name: &str) -> Result<Deliverer, RepositoryError> {
        sqlx::query_as::<_, Deliverer>(
            r"
            UPDATE deliverer SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a deliverer; their deliveries become unassigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, id: DelivererId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM deliverer WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
