//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod tax_id;

use secrecy::SecretString;

/// `PERIM_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first so the CLI reads the same settings as the server.
///
/// # Errors
///
/// Returns the preferred variable name if neither is set.
pub fn database_url() -> Result<SecretString, &'static str> {
    dotenvy::dotenv().ok();

    std::env::var("PERIM_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "PERIM_DATABASE_URL")
}
