//! Address route handlers, nested under a customer.
//!
//! Every write goes through the principal-address invariant.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use perim_core::{AddressId, CustomerId};
use tracing::instrument;

use super::extract::{ApiJson, ApiPath};
use crate::db::{AddressRepository, CustomerRepository, RepositoryError};
use crate::error::AppError;
use crate::models::{Address, AddressWrite, CreateAddressRequest, UpdateAddressRequest};
use crate::state::AppState;

/// Build the addresses router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/customers/{customer_id}/addresses",
            get(list).post(create),
        )
        .route(
            "/api/customers/{customer_id}/addresses/{id}",
            get(show).put(replace).patch(update).delete(destroy),
        )
}

/// A missing customer surfaces from the ledger lock as `NotFound`.
fn customer_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("customer or address".to_string()),
        e => e.into(),
    }
}

/// List a customer's addresses, principal first.
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<CustomerId>,
) -> Result<Json<Vec<Address>>, AppError> {
    CustomerRepository::new(state.pool())
        .get(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("customer".to_string()))?;

    let addresses = AddressRepository::new(state.pool())
        .list_for_customer(customer_id)
        .await?;
    Ok(Json(addresses))
}

#[instrument(skip(state, body))]
async fn create(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<CustomerId>,
    ApiJson(body): ApiJson<CreateAddressRequest>,
) -> Result<(StatusCode, Json<Address>), AppError> {
    let (fields, principal) = body.validate()?;
    let address = AddressRepository::new(state.pool())
        .save(&AddressWrite::insert(customer_id, fields, principal))
        .await
        .map_err(customer_not_found)?;

    tracing::info!(customer_id = %customer_id, address_id = %address.id, "Address created");
    Ok((StatusCode::CREATED, Json(address)))
}

#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    ApiPath((customer_id, id)): ApiPath<(CustomerId, AddressId)>,
) -> Result<Json<Address>, AppError> {
    AddressRepository::new(state.pool())
        .get(customer_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("address".to_string()))
}

#[instrument(skip(state, body))]
async fn replace(
    State(state): State<AppState>,
    ApiPath((customer_id, id)): ApiPath<(CustomerId, AddressId)>,
    ApiJson(body): ApiJson<CreateAddressRequest>,
) -> Result<Json<Address>, AppError> {
    let (fields, principal) = body.validate()?;
    let address = AddressRepository::new(state.pool())
        .save(&AddressWrite::update(id, customer_id, fields, principal))
        .await
        .map_err(customer_not_found)?;
    Ok(Json(address))
}

#[instrument(skip(state, body))]
async fn update(
    State(state): State<AppState>,
    ApiPath((customer_id, id)): ApiPath<(CustomerId, AddressId)>,
    ApiJson(body): ApiJson<UpdateAddressRequest>,
) -> Result<Json<Address>, AppError> {
    let repo = AddressRepository::new(state.pool());
    let existing = repo
        .get(customer_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("address".to_string()))?;

    let (fields, principal) = body.apply(&existing)?;
    let address = repo
        .save(&AddressWrite::patch(id, customer_id, fields, principal))
        .await
        .map_err(customer_not_found)?;
    Ok(Json(address))
}

/// Delete an address; a remaining address is promoted if it was the principal.
#[instrument(skip(state))]
async fn destroy(
    State(state): State<AppState>,
    ApiPath((customer_id, id)): ApiPath<(CustomerId, AddressId)>,
) -> Result<StatusCode, AppError> {
    let deleted = AddressRepository::new(state.pool())
        .delete(customer_id, id)
        .await
        .map_err(customer_not_found)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("address".to_string()))
    }
}
