//! Deliverer route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use perim_core::DelivererId;
use tracing::instrument;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::db::{DelivererRepository, RepositoryError};
use crate::error::AppError;
use crate::models::{CreateDelivererRequest, Deliverer, Page, PageQuery, UpdateDelivererRequest};
use crate::state::AppState;

/// Build the deliverers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/deliverers", get(list).post(create))
        .route(
            "/api/deliverers/{id}",
            get(show).put(replace).patch(update).delete(destroy),
        )
}

fn not_found() -> AppError {
    AppError::NotFound("deliverer".to_string())
}

fn or_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => not_found(),
        e => e.into(),
    }
}

#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<Json<Page<Deliverer>>, AppError> {
    let repo = DelivererRepository::new(state.pool());
    let count = repo.count().await?;
    let results = repo.list(page.limit(), page.offset()).await?;
    Ok(Json(Page::new(page, count, results)))
}

#[instrument(skip(state, body))]
async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateDelivererRequest>,
) -> Result<(StatusCode, Json<Deliverer>), AppError> {
    let name = body.validate()?;
    let deliverer = DelivererRepository::new(state.pool()).create(&name).await?;
    Ok((StatusCode::CREATED, Json(deliverer)))
}

#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DelivererId>,
) -> Result<Json<Deliverer>, AppError> {
    DelivererRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(state, body))]
async fn replace(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DelivererId>,
    ApiJson(body): ApiJson<CreateDelivererRequest>,
) -> Result<Json<Deliverer>, AppError> {
    let name = body.validate()?;
    let deliverer = DelivererRepository::new(state.pool())
        .update(id, &name)
        .await
        .map_err(or_not_found)?;
    Ok(Json(deliverer))
}

#[instrument(skip(state, body))]
async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DelivererId>,
    ApiJson(body): ApiJson<UpdateDelivererRequest>,
) -> Result<Json<Deliverer>, AppError> {
    let repo = DelivererRepository::new(state.pool());
    let existing = repo.get(id).await?.ok_or_else(not_found)?;
    let name = body.apply(&existing)?;
    Ok(Json(repo.update(id, &name).await.map_err(or_not_found)?))
}

/// Delete a deliverer; their deliveries become unassigned.
#[instrument(skip(state))]
async fn destroy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DelivererId>,
) -> Result<StatusCode, AppError> {
    if DelivererRepository::new(state.pool()).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
