//! Postal-code (CEP) lookup against a ViaCEP-compatible service.
//!
//! Requests go to `{base_url}/{digits}/json/`. The service answers `200` with
//! `{"erro": true}` for unknown codes, so "not found" is read from the body.

use std::sync::Arc;

use perim_core::{PostalCode, PostalCodeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::PostalLookupConfig;

/// Errors that can occur during a postal-code lookup.
#[derive(Debug, Error)]
pub enum PostalLookupError {
    /// The input does not reduce to 8 digits.
    #[error(transparent)]
    InvalidInput(#[from] PostalCodeError),

    /// The service does not know this code.
    #[error("postal code not found")]
    NotFound,

    /// The service did not answer within the configured timeout.
    #[error("postal code service timed out")]
    Timeout,

    /// Network, HTTP status or payload failure.
    #[error("postal code service error: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for PostalLookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Upstream(e.to_string())
        }
    }
}

/// Address fields returned by a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostalCodeLookup {
    pub postal_code: String,
    pub street: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// Raw ViaCEP payload.
#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    cep: String,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    complemento: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    /// `true` (or `"true"` on newer deployments) for unknown codes.
    #[serde(default)]
    erro: Option<serde_json::Value>,
}

impl ViaCepResponse {
    fn is_error(&self) -> bool {
        match &self.erro {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
            Some(_) => true,
        }
    }
}

impl From<ViaCepResponse> for PostalCodeLookup {
    fn from(r: ViaCepResponse) -> Self {
        Self {
            postal_code: r.cep,
            street: r.logradouro,
            complement: r.complemento,
            neighborhood: r.bairro,
            city: r.localidade,
            state: r.uf,
        }
    }
}

/// Postal-code lookup client.
#[derive(Clone)]
pub struct PostalCodeClient {
    inner: Arc<PostalCodeClientInner>,
}

struct PostalCodeClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl PostalCodeClient {
    /// Create a client with the configured base URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns `PostalLookupError::Upstream` if the HTTP client fails to build.
    pub fn new(config: &PostalLookupConfig) -> Result<Self, PostalLookupError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PostalLookupError::Upstream(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(PostalCodeClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_owned(),
            }),
        })
    }

    /// Look up the address for a postal code.
    ///
    /// Accepts `01001000`, `01001-000` or `01.001-000`.
    ///
    /// # Errors
    ///
    /// See [`PostalLookupError`] for the possible failures.
    #[instrument(skip(self))]
    pub async fn lookup(&self, raw: &str) -> Result<PostalCodeLookup, PostalLookupError> {
        let digits = PostalCode::lookup_digits(raw)?;
        let url = format!("{}/{digits}/json/", self.inner.base_url);

        let response = self.inner.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "Postal code service returned an error status");
            return Err(PostalLookupError::Upstream(format!(
                "unexpected status {status}"
            )));
        }

        let body: ViaCepResponse = response.json().await?;
        if body.is_error() {
            return Err(PostalLookupError::NotFound);
        }

        Ok(body.into())
    }
}
