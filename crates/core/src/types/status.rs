//! Status enums for deliveries.

use serde::{Deserialize, Serialize};

/// Where a delivery is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "delivery_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Registered, not yet dispatched.
    #[default]
    Pending,
    /// Out with a deliverer.
    InTransit,
    /// Handed over to the customer.
    Delivered,
}

impl DeliveryStatus {
    /// All statuses in their natural order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::InTransit, Self::Delivered];

    /// Wire/database value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
        }
    }

    /// Human-readable label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InTransit => "In transit",
            Self::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            _ => Err(format!("invalid delivery status: {s}")),
        }
    }
}
