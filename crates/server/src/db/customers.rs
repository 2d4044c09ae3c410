//! Customer repository.

use perim_core::{CustomerId, TaxId};
use sqlx::PgPool;

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Customer, CustomerFilter, NewCustomer};

const COLUMNS: &str = "id, name, tax_id, phone, created_at, updated_at";

const TAX_ID_CONFLICT: &str = "this tax id is already registered";

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List customers by name with optional filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: &CustomerFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let query = format!(
            r"
            SELECT {COLUMNS}
            FROM customer
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL
                   OR name ILIKE '%' || $2 || '%'
                   OR tax_id ILIKE '%' || $2 || '%'
                   OR phone ILIKE '%' || $2 || '%')
            ORDER BY name, id
            LIMIT $3 OFFSET $4
            "
        );
        let customers = sqlx::query_as::<_, Customer>(&query)
            .bind(non_blank(filter.name.as_deref()))
            .bind(non_blank(filter.search.as_deref()))
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;

        Ok(customers)
    }

    /// Count customers matching the filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self, filter: &CustomerFilter) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM customer
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL
                   OR name ILIKE '%' || $2 || '%'
                   OR tax_id ILIKE '%' || $2 || '%'
                   OR phone ILIKE '%' || $2 || '%')
            ",
        )
        .bind(non_blank(filter.name.as_deref()))
        .bind(non_blank(filter.search.as_deref()))
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM customer WHERE id = $1");
        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(customer)
    }

    /// Whether another customer already holds this tax id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn tax_id_taken(
        &self,
        tax_id: &TaxId,
        excluding: Option<CustomerId>,
    ) -> Result<bool, RepositoryError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM customer
                WHERE tax_id = $1 AND ($2::bigint IS NULL OR id <> $2)
            )
            ",
        )
        .bind(tax_id)
        .bind(excluding)
        .fetch_one(self.pool)
        .await?;

        Ok(taken)
    }

    /// Create a new customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the tax id is already registered.
    pub async fn create(&self, customer: &NewCustomer) -> Result<Customer, RepositoryError> {
        let query = format!(
            "INSERT INTO customer (name, tax_id, phone) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(&customer.name)
            .bind(&customer.tax_id)
            .bind(&customer.phone)
            .fetch_one(self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, TAX_ID_CONFLICT))
    }

    /// Replace a customer's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer doesn't exist, or
    /// `RepositoryError::Conflict` if the tax id belongs to someone else.
    pub async fn update(
        &self,
        id: CustomerId,
        customer: &NewCustomer,
    ) -> Result<Customer, RepositoryError> {
        let query = format!(
            r"
            UPDATE customer
            SET name = $2, tax_id = $3, phone = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .bind(&customer.name)
            .bind(&customer.tax_id)
            .bind(&customer.phone)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, TAX_ID_CONFLICT))?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a customer; addresses and deliveries cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, id: CustomerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM customer WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Treat blank filter values as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
