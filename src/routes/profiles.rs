use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::models::{Location, NewProfile, Profile, ProfileUpdate, Project, TargetType};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::{Outcome, UpvoteStatus};
use crate::services::{LocationInput, MapPin, ProfileDetail};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub hidden: bool,
}

#[derive(Debug, Serialize)]
pub struct StreakResponse {
    pub streak: i64,
}

#[derive(Debug, Serialize)]
pub struct BadgesResponse {
    pub badges: Vec<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/profiles", post(create_profile))
        .route("/api/profiles/me", get(my_profile).patch(update_profile))
        .route("/api/profiles/me/activity", post(record_activity))
        .route("/api/profiles/me/location", put(update_location))
        .route("/api/profiles/me/location/visibility", put(set_visibility))
        .route("/api/profiles/by-username/{username}", get(profile_by_username))
        .route("/api/profiles/{user_id}", get(profile))
        .route("/api/profiles/{user_id}/badges", get(badges))
        .route("/api/profiles/{user_id}/badges/refresh", post(refresh_badges))
        .route("/api/profiles/{user_id}/views", post(count_view))
        .route(
            "/api/profiles/{user_id}/upvote",
            get(can_upvote).post(upvote).delete(remove_upvote),
        )
        .route("/api/profiles/{user_id}/projects", get(projects))
        .route("/api/map", get(map))
}

/// POST /api/profiles
async fn create_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<NewProfile>,
) -> AppResult<(StatusCode, Json<Profile>)> {
    let profile = state.profiles.create(&user.id, req).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn my_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ProfileDetail>> {
    Ok(Json(state.profiles.get(&user.id).await?))
}

/// PATCH /api/profiles/me
async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ProfileUpdate>,
) -> AppResult<Json<Profile>> {
    Ok(Json(state.profiles.update(&user.id, req).await?))
}

/// POST /api/profiles/me/activity
async fn record_activity(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<StreakResponse>> {
    let streak = state.profiles.record_activity(&user.id).await?;
    Ok(Json(StreakResponse { streak }))
}

/// PUT /api/profiles/me/location
async fn update_location(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<LocationInput>,
) -> AppResult<Json<Location>> {
    Ok(Json(state.profiles.update_location(&user.id, req).await?))
}

/// PUT /api/profiles/me/location/visibility
async fn set_visibility(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<VisibilityRequest>,
) -> AppResult<Json<Outcome>> {
    state
        .profiles
        .set_location_hidden(&user.id, req.hidden)
        .await?;
    Ok(Json(Outcome { success: true }))
}

async fn profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<ProfileDetail>> {
    Ok(Json(state.profiles.get(&user_id).await?))
}

async fn profile_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<ProfileDetail>> {
    Ok(Json(state.profiles.get_by_username(&username).await?))
}

/// GET /api/profiles/{user_id}/badges
/// Badges earned by the current counters, whether or not they are stored yet.
async fn badges(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<BadgesResponse>> {
    let badges = state
        .leaderboard
        .badges(&user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(BadgesResponse { badges }))
}

async fn refresh_badges(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<BadgesResponse>> {
    let badges = state
        .leaderboard
        .refresh_badges(&user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(BadgesResponse { badges }))
}

/// POST /api/profiles/{user_id}/views
async fn count_view(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Outcome>> {
    if !state.profiles.increment_profile_views(&user_id).await {
        return Err(AppError::NotFound);
    }
    Ok(Json(Outcome { success: true }))
}

async fn can_upvote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> Json<UpvoteStatus> {
    let can_upvote = state
        .ledger
        .can_upvote(&user_id, &user.id, TargetType::Profile)
        .await;
    Json(UpvoteStatus { can_upvote })
}

/// POST /api/profiles/{user_id}/upvote
async fn upvote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> Json<Outcome> {
    let success = state.ledger.add_profile_upvote(&user_id, &user.id).await;
    Json(Outcome { success })
}

/// DELETE /api/profiles/{user_id}/upvote
async fn remove_upvote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> Json<Outcome> {
    let success = state.ledger.remove_profile_upvote(&user_id, &user.id).await;
    Json(Outcome { success })
}

async fn projects(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Project>>> {
    Ok(Json(state.profiles.list_projects(&user_id).await?))
}

/// GET /api/map
async fn map(State(state): State<AppState>) -> AppResult<Json<Vec<MapPin>>> {
    Ok(Json(state.profiles.users_with_locations().await?))
}
