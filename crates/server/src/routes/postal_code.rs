//! Postal-code lookup route.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use tracing::instrument;

use super::extract::ApiJson;
use crate::error::AppError;
use crate::services::PostalCodeLookup;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/postal-code-lookup", post(lookup))
}

#[derive(Debug, Deserialize)]
struct LookupRequest {
    #[serde(default)]
    postal_code: String,
}

/// Resolve a postal code to street, neighborhood, city and state.
#[instrument(skip(state))]
async fn lookup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LookupRequest>,
) -> Result<Json<PostalCodeLookup>, AppError> {
    let found = state.postal_codes().lookup(&body.postal_code).await?;
    Ok(Json(found))
}
