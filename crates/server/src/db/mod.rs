//! Database operations for Perim `PostgreSQL`.
//!
//! ## Tables
//!
//! - `customer` - Customers, unique by tax id
//! - `address` - Customer addresses; at most one `principal` per customer
//!   (partial unique index `address_one_principal_per_customer`)
//! - `deliverer` - People who carry deliveries
//! - `delivery` - Deliveries, referencing customer, address and deliverer
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p perim-cli -- migrate
//! ```

pub mod addresses;
pub mod customers;
pub mod deliverers;
pub mod deliveries;
pub mod stats;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use customers::CustomerRepository;
pub use deliverers::DelivererRepository;
pub use deliveries::DeliveryRepository;
pub use stats::StatsRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (unique tax id, second principal address).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A foreign key named a row that is gone; carries the violated constraint.
    #[error("referenced row does not exist: {0}")]
    MissingReference(String),
}

/// Map a unique violation to [`RepositoryError::Conflict`], anything else to `Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Map a foreign-key violation to [`RepositoryError::MissingReference`],
/// anything else to `Database`.
pub(crate) fn reference_violation(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        let constraint = db_err.constraint().unwrap_or_default().to_owned();
        return RepositoryError::MissingReference(constraint);
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
