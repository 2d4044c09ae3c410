//! Address repository.
//!
//! Writes go through [`crate::principal`] inside one transaction so the
//! single-principal invariant holds after every save and delete.

use perim_core::{AddressId, CustomerId};
use sqlx::{PgConnection, PgPool};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Address, AddressWrite};
use crate::principal::{self, AddressLedger};

const COLUMNS: &str = "id, customer_id, postal_code, street, number, complement, \
     neighborhood, city, state, principal, created_at, updated_at";

const PRINCIPAL_CONFLICT: &str = "customer already has a principal address";

impl AddressLedger for PgConnection {
    async fn lock_customer(&mut self, customer_id: CustomerId) -> Result<(), RepositoryError> {
        sqlx::query_scalar::<_, CustomerId>("SELECT id FROM customer WHERE id = $1 FOR UPDATE")
            .bind(customer_id)
            .fetch_optional(&mut *self)
            .await?
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn demote_principals(
        &mut self,
        customer_id: CustomerId,
        keep: Option<AddressId>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE address
            SET principal = FALSE, updated_at = NOW()
            WHERE customer_id = $1
              AND principal
              AND ($2::bigint IS NULL OR id <> $2)
            ",
        )
        .bind(customer_id)
        .bind(keep)
        .execute(&mut *self)
        .await?;

        Ok(result.rows_affected())
    }

    async fn stored_principal(
        &mut self,
        customer_id: CustomerId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT principal FROM address WHERE id = $1 AND customer_id = $2",
        )
        .bind(id)
        .bind(customer_id)
        .fetch_optional(&mut *self)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn persist(
        &mut self,
        write: &AddressWrite,
        principal: bool,
    ) -> Result<Address, RepositoryError> {
        let f = &write.fields;
        let query = match write.id {
            None => format!(
                "INSERT INTO address (customer_id, postal_code, street, number, complement, \
                 neighborhood, city, state, principal) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 RETURNING {COLUMNS}"
            ),
            Some(_) => format!(
                "UPDATE address SET postal_code = $2, street = $3, number = $4, complement = $5, \
                 neighborhood = $6, city = $7, state = $8, principal = $9, updated_at = NOW() \
                 WHERE id = $10 AND customer_id = $1 \
                 RETURNING {COLUMNS}"
            ),
        };

        let mut statement = sqlx::query_as::<_, Address>(&query)
            .bind(write.customer_id)
            .bind(&f.postal_code)
            .bind(&f.street)
            .bind(&f.number)
            .bind(&f.complement)
            .bind(&f.neighborhood)
            .bind(&f.city)
            .bind(&f.state)
            .bind(principal);
        if let Some(id) = write.id {
            statement = statement.bind(id);
        }

        statement
            .fetch_optional(&mut *self)
            .await
            .map_err(|e| conflict_on_unique(e, PRINCIPAL_CONFLICT))?
            .ok_or(RepositoryError::NotFound)
    }

    async fn has_principal(
        &mut self,
        customer_id: CustomerId,
        excluding: Option<AddressId>,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM address
                WHERE customer_id = $1
                  AND principal
                  AND ($2::bigint IS NULL OR id <> $2)
            )
            ",
        )
        .bind(customer_id)
        .bind(excluding)
        .fetch_one(&mut *self)
        .await?;

        Ok(exists)
    }

    async fn count_addresses(&mut self, customer_id: CustomerId) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM address WHERE customer_id = $1")
                .bind(customer_id)
                .fetch_one(&mut *self)
                .await?;

        Ok(count)
    }

    async fn mark_principal(&mut self, id: AddressId) -> Result<Address, RepositoryError> {
        let query = format!(
            "UPDATE address SET principal = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Address>(&query)
            .bind(id)
            .fetch_optional(&mut *self)
            .await
            .map_err(|e| conflict_on_unique(e, PRINCIPAL_CONFLICT))?
            .ok_or(RepositoryError::NotFound)
    }

    async fn first_address(
        &mut self,
        customer_id: CustomerId,
    ) -> Result<Option<AddressId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, AddressId>(
            "SELECT id FROM address WHERE customer_id = $1 ORDER BY street, id LIMIT 1",
        )
        .bind(customer_id)
        .fetch_optional(&mut *self)
        .await?;

        Ok(id)
    }

    async fn remove(
        &mut self,
        customer_id: CustomerId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM address WHERE id = $1 AND customer_id = $2")
            .bind(id)
            .bind(customer_id)
            .execute(&mut *self)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a customer's addresses, principal first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let query = format!(
            "SELECT {COLUMNS} FROM address WHERE customer_id = $1 \
             ORDER BY principal DESC, street, id"
        );
        let addresses = sqlx::query_as::<_, Address>(&query)
            .bind(customer_id)
            .fetch_all(self.pool)
            .await?;

        Ok(addresses)
    }

    /// List the addresses of several customers at once, principal first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_customers(
        &self,
        customer_ids: &[CustomerId],
    ) -> Result<Vec<Address>, RepositoryError> {
        let ids: Vec<i64> = customer_ids.iter().copied().map(CustomerId::as_i64).collect();
        let query = format!(
            "SELECT {COLUMNS} FROM address WHERE customer_id = ANY($1) \
             ORDER BY customer_id, principal DESC, street, id"
        );
        let addresses = sqlx::query_as::<_, Address>(&query)
            .bind(ids)
            .fetch_all(self.pool)
            .await?;

        Ok(addresses)
    }

    /// Get one address of a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(
        &self,
        customer_id: CustomerId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM address WHERE id = $1 AND customer_id = $2");
        let address = sqlx::query_as::<_, Address>(&query)
            .bind(id)
            .bind(customer_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(address)
    }

    /// Get an address regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM address WHERE id = $1");
        let address = sqlx::query_as::<_, Address>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(address)
    }

    /// Insert or update an address, keeping exactly one principal per customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer or address does not
    /// exist, or `RepositoryError::Conflict` on a concurrent principal clash.
    pub async fn save(&self, write: &AddressWrite) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let address = principal::save_address(&mut *tx, write).await?;
        tx.commit().await?;

        Ok(address)
    }

    /// Delete an address, promoting a replacement principal when needed.
    ///
    /// Returns `false` if the address does not belong to the customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    pub async fn delete(
        &self,
        customer_id: CustomerId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let deleted = principal::delete_address(&mut *tx, customer_id, id).await?;
        tx.commit().await?;

        Ok(deleted)
    }
}
