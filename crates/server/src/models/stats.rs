//! Dashboard statistics.

use perim_core::{CustomerId, DelivererId, DeliveryStatus};
use serde::Serialize;

/// Label used when nobody has deliveries scheduled today.
pub const NO_DELIVERER_TODAY: &str = "No deliverer with deliveries today";

/// Aggregate counts for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total_customers: i64,
    pub total_deliveries: i64,
    pub total_addresses: i64,
    pub total_deliverers: i64,
    /// Deliveries per `YYYY-MM` over the last 180 days, oldest first.
    pub deliveries_by_month: Vec<MonthlyCount>,
    pub top_customers: Vec<TopCustomer>,
    pub deliverer_of_the_day: DelivererOfTheDay,
    pub status_distribution: Vec<StatusCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MonthlyCount {
    pub month: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TopCustomer {
    pub id: CustomerId,
    pub name: String,
    pub total_deliveries: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DelivererOfTheDay {
    pub id: Option<DelivererId>,
    pub name: String,
    pub total_today: i64,
}

impl Default for DelivererOfTheDay {
    fn default() -> Self {
        Self {
            id: None,
            name: NO_DELIVERER_TODAY.to_owned(),
            total_today: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: DeliveryStatus,
    pub total: i64,
}
