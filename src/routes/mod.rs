pub mod analytics;
pub mod leaderboard;
pub mod profiles;
pub mod projects;

use axum::Router;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Body returned by ledger and counter endpoints.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct UpvoteStatus {
    pub can_upvote: bool,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(leaderboard::router())
        .merge(profiles::router())
        .merge(projects::router())
        .merge(analytics::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
