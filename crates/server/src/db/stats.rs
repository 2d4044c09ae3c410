//! Dashboard aggregates.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{DelivererOfTheDay, MonthlyCount, Stats, StatusCount, TopCustomer};

/// Number of customers listed in `top_customers`.
const TOP_CUSTOMERS: i64 = 5;

/// Repository for statistics queries.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Compute all dashboard aggregates.
    ///
    /// `since` bounds the monthly series; `today` (a UTC date) selects the
    /// deliverer of the day. Months and days are bucketed in UTC.
    ///
    /// # Errors
    ///
    /// Returns an error if any database query fails.
    pub async fn load(
        &self,
        since: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<Stats, RepositoryError> {
        let (total_customers, total_deliveries, total_addresses, total_deliverers) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r"
                SELECT
                    (SELECT COUNT(*) FROM customer),
                    (SELECT COUNT(*) FROM delivery),
                    (SELECT COUNT(*) FROM address),
                    (SELECT COUNT(*) FROM deliverer)
                ",
            )
            .fetch_one(self.pool)
            .await?;

        let deliveries_by_month = sqlx::query_as::<_, MonthlyCount>(
            r"
            SELECT to_char(date_trunc('month', scheduled_at AT TIME ZONE 'UTC'), 'YYYY-MM') AS month,
                   COUNT(*) AS total
            FROM delivery
            WHERE scheduled_at >= $1
            GROUP BY 1
            ORDER BY 1
            ",
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        let top_customers = sqlx::query_as::<_, TopCustomer>(
            r"
            SELECT c.id, c.name, COUNT(d.id) AS total_deliveries
            FROM customer c
            JOIN delivery d ON d.customer_id = c.id
            GROUP BY c.id, c.name
            ORDER BY total_deliveries DESC, c.name
            LIMIT $1
            ",
        )
        .bind(TOP_CUSTOMERS)
        .fetch_all(self.pool)
        .await?;

        let deliverer_of_the_day = sqlx::query_as::<_, DelivererOfTheDay>(
            r"
            SELECT dl.id, dl.name, COUNT(d.id) AS total_today
            FROM deliverer dl
            JOIN delivery d ON d.deliverer_id = dl.id
            WHERE (d.scheduled_at AT TIME ZONE 'UTC')::date = $1
            GROUP BY dl.id, dl.name
            ORDER BY total_today DESC, dl.name
            LIMIT 1
            ",
        )
        .bind(today)
        .fetch_optional(self.pool)
        .await?
        .unwrap_or_default();

        let status_distribution = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS total FROM delivery GROUP BY status ORDER BY status",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(Stats {
            total_customers,
            total_deliveries,
            total_addresses,
            total_deliverers,
            deliveries_by_month,
            top_customers,
            deliverer_of_the_day,
            status_distribution,
        })
    }
}
