//! Customer route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use perim_core::CustomerId;
use tracing::instrument;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::db::{CustomerRepository, DeliveryRepository};
use crate::error::AppError;
use crate::models::{
    CreateCustomerRequest, CustomerDeliveries, CustomerFilter, CustomerWithAddresses, Page,
    PageQuery, UpdateCustomerRequest,
};
use crate::services::CustomerService;
use crate::state::AppState;

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list).post(create))
        .route(
            "/api/customers/{id}",
            get(show).put(replace).patch(update).delete(destroy),
        )
        .route("/api/customers/{id}/deliveries", get(deliveries))
}

/// List customers with their addresses.
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<CustomerFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<Json<Page<CustomerWithAddresses>>, AppError> {
    let page = CustomerService::new(state.pool()).list(&filter, page).await?;
    Ok(Json(page))
}

#[instrument(skip(state, body))]
async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerWithAddresses>), AppError> {
    let customer = CustomerService::new(state.pool()).create(&body).await?;
    Ok((
        StatusCode::CREATED,
        Json(CustomerWithAddresses::new(customer, Vec::new())),
    ))
}

#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<Json<CustomerWithAddresses>, AppError> {
    Ok(Json(CustomerService::new(state.pool()).detail(id).await?))
}

#[instrument(skip(state, body))]
async fn replace(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomerId>,
    ApiJson(body): ApiJson<CreateCustomerRequest>,
) -> Result<Json<CustomerWithAddresses>, AppError> {
    let service = CustomerService::new(state.pool());
    service.replace(id, &body).await?;
    Ok(Json(service.detail(id).await?))
}

#[instrument(skip(state, body))]
async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomerId>,
    ApiJson(body): ApiJson<UpdateCustomerRequest>,
) -> Result<Json<CustomerWithAddresses>, AppError> {
    let service = CustomerService::new(state.pool());
    service.patch(id, body).await?;
    Ok(Json(service.detail(id).await?))
}

/// Delete a customer with its addresses and deliveries.
#[instrument(skip(state))]
async fn destroy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<StatusCode, AppError> {
    if CustomerRepository::new(state.pool()).delete(id).await? {
        tracing::info!(customer_id = %id, "Customer deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("customer".to_string()))
    }
}

/// A customer together with all of their deliveries.
#[instrument(skip(state))]
async fn deliveries(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<Json<CustomerDeliveries>, AppError> {
    let customer = CustomerService::new(state.pool()).detail(id).await?;
    let deliveries = DeliveryRepository::new(state.pool())
        .list_for_customer(id)
        .await?;
    Ok(Json(CustomerDeliveries {
        customer,
        deliveries,
    }))
}
