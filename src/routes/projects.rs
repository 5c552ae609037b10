use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::{NewProject, Project, ProjectUpdate, TargetType, TrendingProject};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::{Outcome, UpvoteStatus};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/projects", post(add_project))
        .route("/api/projects/trending", get(trending))
        .route(
            "/api/projects/{id}",
            patch(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/views", post(count_view))
        .route(
            "/api/projects/{id}/upvote",
            get(can_upvote).post(upvote).delete(remove_upvote),
        )
}

/// POST /api/projects
async fn add_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<NewProject>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let project = state.profiles.add_project(&user.id, req).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects/trending?limit=
async fn trending(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> AppResult<Json<Vec<TrendingProject>>> {
    Ok(Json(state.analytics.trending_projects(query.limit).await?))
}

async fn update_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<ProjectUpdate>,
) -> AppResult<Json<Project>> {
    Ok(Json(state.profiles.update_project(&user.id, &id, req).await?))
}

async fn delete_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.profiles.delete_project(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn count_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Outcome>> {
    if !state.profiles.increment_project_views(&id).await {
        return Err(AppError::NotFound);
    }
    Ok(Json(Outcome { success: true }))
}

async fn can_upvote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Json<UpvoteStatus> {
    let can_upvote = state
        .ledger
        .can_upvote(&id, &user.id, TargetType::Project)
        .await;
    Json(UpvoteStatus { can_upvote })
}

async fn upvote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Json<Outcome> {
    let success = state.ledger.add_project_upvote(&id, &user.id).await;
    Json(Outcome { success })
}

async fn remove_upvote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Json<Outcome> {
    let success = state.ledger.remove_project_upvote(&id, &user.id).await;
    Json(Outcome { success })
}
