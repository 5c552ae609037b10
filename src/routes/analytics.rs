use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::DailyStat;
use crate::error::{AppError, AppResult};
use crate::ranking::{ActivityEvent, GrowthRate};
use crate::services::{GlobalAnalytics, UserAnalytics};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    pub days: Option<i64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DailyQuery {
    pub days: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/analytics/global", get(global))
        .route("/api/analytics/users/{user_id}", get(user))
        .route("/api/analytics/users/{user_id}/growth", get(growth))
        .route("/api/analytics/users/{user_id}/timeline", get(timeline))
        .route("/api/analytics/users/{user_id}/daily", get(daily))
}

async fn global(State(state): State<AppState>) -> AppResult<Json<GlobalAnalytics>> {
    Ok(Json(state.analytics.global_analytics().await?))
}

async fn user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserAnalytics>> {
    state
        .analytics
        .user_analytics(&user_id)
        .await
        .map(Json)
        .ok_or(AppError::NotFound)
}

async fn growth(State(state): State<AppState>, Path(user_id): Path<String>) -> Json<GrowthRate> {
    Json(state.analytics.growth_rate(&user_id).await)
}

/// GET /api/analytics/users/{user_id}/timeline?days=&limit=
async fn timeline(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<TimelineQuery>,
) -> Json<Vec<ActivityEvent>> {
    Json(
        state
            .analytics
            .activity_timeline(&user_id, query.days, query.limit)
            .await,
    )
}

async fn daily(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DailyQuery>,
) -> AppResult<Json<Vec<DailyStat>>> {
    Ok(Json(state.analytics.daily_stats(&user_id, query.days).await?))
}
