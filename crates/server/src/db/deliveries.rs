//! Delivery repository.

use chrono::{DateTime, Utc};
use perim_core::{CustomerId, DeliveryId, PostalCode, RegionCode};
use sqlx::PgPool;

use super::{RepositoryError, reference_violation};
use crate::models::{Address, Deliverer, Delivery, DeliveryDraft, DeliveryFilter, DeliveryView};

const COLUMNS: &str = "id, customer_id, address_id, deliverer_id, status, box_count, \
     beverages, frozen, cleaning_tools, other, packer_name, invoice_number, invoice_series, \
     purchase_date, scheduled_at, created_at, updated_at";

/// Joined select shared by the view queries. `WHERE`/`ORDER` are appended.
const VIEW_SELECT: &str = r"
    SELECT
        d.id, d.customer_id, d.address_id, d.deliverer_id, d.status, d.box_count,
        d.beverages, d.frozen, d.cleaning_tools, d.other, d.packer_name,
        d.invoice_number, d.invoice_series, d.purchase_date, d.scheduled_at,
        d.created_at, d.updated_at,
        c.name AS customer_name,
        a.postal_code AS address_postal_code, a.street AS address_street,
        a.number AS address_number, a.complement AS address_complement,
        a.neighborhood AS address_neighborhood, a.city AS address_city,
        a.state AS address_state, a.principal AS address_principal,
        a.created_at AS address_created_at, a.updated_at AS address_updated_at,
        dl.name AS deliverer_name, dl.created_at AS deliverer_created_at,
        dl.updated_at AS deliverer_updated_at
    FROM delivery d
    JOIN customer c ON c.id = d.customer_id
    JOIN address a ON a.id = d.address_id
    LEFT JOIN deliverer dl ON dl.id = d.deliverer_id
";

/// Filter clause over `VIEW_SELECT`, parameters `$1..=$6`.
///
/// Dates are UTC calendar days regardless of the session `TimeZone`.
const FILTER_WHERE: &str = r"
    WHERE ($1::bigint IS NULL OR d.customer_id = $1)
      AND ($2::bigint IS NULL OR d.deliverer_id = $2)
      AND ($3::date IS NULL OR (d.scheduled_at AT TIME ZONE 'UTC')::date >= $3)
      AND ($4::date IS NULL OR (d.scheduled_at AT TIME ZONE 'UTC')::date <= $4)
      AND ($5::delivery_status IS NULL OR d.status = $5)
      AND ($6::text IS NULL
           OR c.name ILIKE '%' || $6 || '%'
           OR dl.name ILIKE '%' || $6 || '%'
           OR d.status::text ILIKE '%' || $6 || '%'
           OR d.invoice_number ILIKE '%' || $6 || '%'
           OR d.packer_name ILIKE '%' || $6 || '%'
           OR a.street ILIKE '%' || $6 || '%'
           OR a.neighborhood ILIKE '%' || $6 || '%'
           OR a.postal_code ILIKE '%' || $6 || '%')
";

/// Internal row type for the joined view query.
#[derive(sqlx::FromRow)]
struct DeliveryViewRow {
    #[sqlx(flatten)]
    delivery: Delivery,
    customer_name: String,
    address_postal_code: PostalCode,
    address_street: String,
    address_number: String,
    address_complement: Option<String>,
    address_neighborhood: String,
    address_city: String,
    address_state: RegionCode,
    address_principal: bool,
    address_created_at: DateTime<Utc>,
    address_updated_at: DateTime<Utc>,
    deliverer_name: Option<String>,
    deliverer_created_at: Option<DateTime<Utc>>,
    deliverer_updated_at: Option<DateTime<Utc>>,
}

impl From<DeliveryViewRow> for DeliveryView {
    fn from(row: DeliveryViewRow) -> Self {
        let address = Address {
            id: row.delivery.address_id,
            customer_id: row.delivery.customer_id,
            postal_code: row.address_postal_code,
            street: row.address_street,
            number: row.address_number,
            complement: row.address_complement,
            neighborhood: row.address_neighborhood,
            city: row.address_city,
            state: row.address_state,
            principal: row.address_principal,
            created_at: row.address_created_at,
            updated_at: row.address_updated_at,
        };
        let deliverer = match (
            row.delivery.deliverer_id,
            row.deliverer_name,
            row.deliverer_created_at,
            row.deliverer_updated_at,
        ) {
            (Some(id), Some(name), Some(created_at), Some(updated_at)) => Some(Deliverer {
                id,
                name,
                created_at,
                updated_at,
            }),
            _ => None,
        };

        Self::new(row.delivery, row.customer_name, address, deliverer)
    }
}

/// Repository for delivery database operations.
pub struct DeliveryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DeliveryRepository<'a> {
    /// Create a new delivery repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List deliveries, newest scheduled first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: &DeliveryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DeliveryView>, RepositoryError> {
        let query =
            format!("{VIEW_SELECT} {FILTER_WHERE} ORDER BY d.scheduled_at DESC, d.id DESC LIMIT $7 OFFSET $8");
        let rows = sqlx::query_as::<_, DeliveryViewRow>(&query)
            .bind(filter.customer)
            .bind(filter.deliverer)
            .bind(filter.start())
            .bind(filter.end())
            .bind(filter.status)
            .bind(filter.search_term())
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Count deliveries matching the filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self, filter: &DeliveryFilter) -> Result<i64, RepositoryError> {
        let query = format!(
            r"
            SELECT COUNT(*)
            FROM delivery d
            JOIN customer c ON c.id = d.customer_id
            JOIN address a ON a.id = d.address_id
            LEFT JOIN deliverer dl ON dl.id = d.deliverer_id
            {FILTER_WHERE}
            "
        );
        let count = sqlx::query_scalar::<_, i64>(&query)
            .bind(filter.customer)
            .bind(filter.deliverer)
            .bind(filter.start())
            .bind(filter.end())
            .bind(filter.status)
            .bind(filter.search_term())
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// All deliveries of one customer, newest scheduled first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<DeliveryView>, RepositoryError> {
        let query = format!(
            "{VIEW_SELECT} WHERE d.customer_id = $1 ORDER BY d.scheduled_at DESC, d.id DESC"
        );
        let rows = sqlx::query_as::<_, DeliveryViewRow>(&query)
            .bind(customer_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a delivery with its related records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_view(&self, id: DeliveryId) -> Result<Option<DeliveryView>, RepositoryError> {
        let query = format!("{VIEW_SELECT} WHERE d.id = $1");
        let row = sqlx::query_as::<_, DeliveryViewRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get the stored delivery row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: DeliveryId) -> Result<Option<Delivery>, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM delivery WHERE id = $1");
        let delivery = sqlx::query_as::<_, Delivery>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(delivery)
    }

    /// Insert a delivery whose references have already been checked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` if a referenced row was
    /// deleted after the check.
    pub async fn create(&self, draft: &DeliveryDraft) -> Result<Delivery, RepositoryError> {
        let query = format!(
            r"
            INSERT INTO delivery (
                customer_id, address_id, deliverer_id, status, box_count,
                beverages, frozen, cleaning_tools, other, packer_name,
                invoice_number, invoice_series, purchase_date, scheduled_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {COLUMNS}
            "
        );
        let delivery = bind_draft(sqlx::query_as::<_, Delivery>(&query), draft)
            .fetch_one(self.pool)
            .await
            .map_err(reference_violation)?;

        Ok(delivery)
    }

    /// Replace a delivery's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the delivery doesn't exist.
    pub async fn update(
        &self,
        id: DeliveryId,
        draft: &DeliveryDraft,
    ) -> Result<Delivery, RepositoryError> {
        let query = format!(
            r"
            UPDATE delivery SET
                customer_id = $1, address_id = $2, deliverer_id = $3, status = $4,
                box_count = $5, beverages = $6, frozen = $7, cleaning_tools = $8,
                other = $9, packer_name = $10, invoice_number = $11,
                invoice_series = $12, purchase_date = $13, scheduled_at = $14,
                updated_at = NOW()
            WHERE id = $15
            RETURNING {COLUMNS}
            "
        );
        bind_draft(sqlx::query_as::<_, Delivery>(&query), draft)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(reference_violation)?
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, id: DeliveryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM delivery WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

type DeliveryQuery<'q> =
    sqlx::query::QueryAs<'q, sqlx::Postgres, Delivery, sqlx::postgres::PgArguments>;

/// Bind the draft as parameters `$1..=$14`.
fn bind_draft<'q>(query: DeliveryQuery<'q>, draft: &'q DeliveryDraft) -> DeliveryQuery<'q> {
    query
        .bind(draft.customer_id)
        .bind(draft.address_id)
        .bind(draft.deliverer_id)
        .bind(draft.status)
        .bind(draft.box_count)
        .bind(draft.volumes.beverages)
        .bind(draft.volumes.frozen)
        .bind(draft.volumes.cleaning_tools)
        .bind(draft.volumes.other)
        .bind(&draft.packer_name)
        .bind(&draft.invoice_number)
        .bind(&draft.invoice_series)
        .bind(draft.purchase_date)
        .bind(draft.scheduled_at)
}
