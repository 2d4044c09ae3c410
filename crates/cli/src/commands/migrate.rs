//! Database migration commands.
//!
//! Migrations live in `crates/server/migrations/` and are embedded at compile
//! time. The server never runs them on start-up.
//!
//! # Environment Variables
//!
//! - `PERIM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use thiserror::Error;

/// Server schema: customers, addresses, deliverers and deliveries.
pub static MIGRATOR: Migrator = sqlx::migrate!("../server/migrations");

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails or
/// a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url().map_err(MigrationError::MissingEnvVar)?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!(
        available = MIGRATOR.iter().count(),
        "Running migrations from crates/server/migrations/"
    );
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete");
    pool.close().await;
    Ok(())
}
