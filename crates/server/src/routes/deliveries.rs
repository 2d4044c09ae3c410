//! Delivery route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use perim_core::DeliveryId;
use tracing::instrument;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::db::DeliveryRepository;
use crate::error::AppError;
use crate::models::{
    CreateDeliveryRequest, DeliveryFilter, DeliveryView, Page, PageQuery, UpdateDeliveryRequest,
};
use crate::services::DeliveryService;
use crate::state::AppState;

/// Build the deliveries router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/deliveries", get(list).post(create))
        .route(
            "/api/deliveries/{id}",
            get(show).put(replace).patch(update).delete(destroy),
        )
}

/// List deliveries, newest scheduled first.
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<DeliveryFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<Json<Page<DeliveryView>>, AppError> {
    let repo = DeliveryRepository::new(state.pool());
    let count = repo.count(&filter).await?;
    let results = repo.list(&filter, page.limit(), page.offset()).await?;
    Ok(Json(Page::new(page, count, results)))
}

#[instrument(skip(state, body))]
async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateDeliveryRequest>,
) -> Result<(StatusCode, Json<DeliveryView>), AppError> {
    let delivery = DeliveryService::new(state.pool()).create(&body).await?;
    Ok((StatusCode::CREATED, Json(delivery)))
}

#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DeliveryId>,
) -> Result<Json<DeliveryView>, AppError> {
    DeliveryRepository::new(state.pool())
        .get_view(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("delivery".to_string()))
}

#[instrument(skip(state, body))]
async fn replace(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DeliveryId>,
    ApiJson(body): ApiJson<CreateDeliveryRequest>,
) -> Result<Json<DeliveryView>, AppError> {
    Ok(Json(DeliveryService::new(state.pool()).replace(id, &body).await?))
}

#[instrument(skip(state, body))]
async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DeliveryId>,
    ApiJson(body): ApiJson<UpdateDeliveryRequest>,
) -> Result<Json<DeliveryView>, AppError> {
    Ok(Json(DeliveryService::new(state.pool()).patch(id, body).await?))
}

#[instrument(skip(state))]
async fn destroy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DeliveryId>,
) -> Result<StatusCode, AppError> {
    if DeliveryRepository::new(state.pool()).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("delivery".to_string()))
    }
}
