//! Dashboard statistics route.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{TimeDelta, Utc};
use tracing::instrument;

use crate::db::StatsRepository;
use crate::error::AppError;
use crate::models::Stats;
use crate::state::AppState;

/// Window covered by `deliveries_by_month`.
const MONTHLY_WINDOW_DAYS: i64 = 180;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/stats", get(stats))
}

#[instrument(skip(state))]
async fn stats(State(state): State<AppState>) -> Result<Json<Stats>, AppError> {
    let now = Utc::now();
    let stats = StatsRepository::new(state.pool())
        .load(now - TimeDelta::days(MONTHLY_WINDOW_DAYS), now.date_naive())
        .await?;
    Ok(Json(stats))
}
