use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::ranking::{LeaderboardEntry, SortBy};
use crate::services::FeaturedBuilder;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub sort_by: SortBy,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub updated: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/leaderboard/refresh", post(refresh))
        .route("/api/featured", get(featured))
}

/// GET /api/leaderboard?sort_by=
async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<Vec<LeaderboardEntry>> {
    Json(state.leaderboard.leaderboard(query.sort_by).await)
}

/// POST /api/leaderboard/refresh
async fn refresh(State(state): State<AppState>) -> AppResult<Json<RefreshResponse>> {
    let updated = state.leaderboard.refresh_derived().await?;
    Ok(Json(RefreshResponse { updated }))
}

async fn featured(State(state): State<AppState>) -> AppResult<Json<Vec<FeaturedBuilder>>> {
    Ok(Json(state.leaderboard.featured_builders().await?))
}
