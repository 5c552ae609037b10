use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::repository::{DynRepository, SqliteRepository};
use crate::services::{AnalyticsService, LeaderboardService, ProfileService, UpvoteLedger};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub leaderboard: LeaderboardService,
    pub ledger: UpvoteLedger,
    pub analytics: AnalyticsService,
    pub profiles: ProfileService,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        let repo: DynRepository = Arc::new(SqliteRepository::new(pool));
        Self::with_repository(repo, config)
    }

    pub fn with_repository(repo: DynRepository, config: Config) -> Self {
        let leaderboard = LeaderboardService::new(repo.clone(), config.leaderboard.clone());
        Self {
            ledger: UpvoteLedger::new(repo.clone(), leaderboard.clone()),
            analytics: AnalyticsService::new(repo.clone(), config.analytics.clone()),
            profiles: ProfileService::new(repo, config.location.clone()),
            leaderboard,
            config,
        }
    }
}
