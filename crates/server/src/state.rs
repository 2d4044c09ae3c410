//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::{PostalCodeClient, PostalLookupError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    postal_codes: PostalCodeClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the postal-code HTTP client cannot be built.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, PostalLookupError> {
        let postal_codes = PostalCodeClient::new(&config.postal_lookup)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                postal_codes,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the postal-code lookup client.
    #[must_use]
    pub fn postal_codes(&self) -> &PostalCodeClient {
        &self.inner.postal_codes
    }
}
