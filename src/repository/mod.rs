// Repository pattern - isolates all database side effects
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::db::models::{
    DailyDelta, DailyStat, Location, NewProfile, NewProject, Profile, ProfileUpdate, Project,
    ProjectUpdate, TargetType, TrendingProject, UpvoteRecord,
};
use crate::ranking::CreatedWindow;

pub use sqlite::SqliteRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Cached ranking fields written back onto a profile row.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFields {
    pub user_id: String,
    /// `None` keeps the stored rank.
    pub rank: Option<i64>,
    pub badges: Vec<String>,
}

/// Repository trait - every query the services need
#[async_trait]
pub trait Repository: Send + Sync {
    /// Profiles in fetch order (oldest first), optionally limited to a
    /// creation window.
    async fn list_profiles(
        &self,
        created: Option<CreatedWindow>,
    ) -> Result<Vec<Profile>, RepositoryError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, RepositoryError>;

    async fn get_profile_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Profile>, RepositoryError>;

    /// Fails with `Conflict` when the user or username already has a profile.
    async fn insert_profile(
        &self,
        user_id: &str,
        profile: &NewProfile,
        now: DateTime<Utc>,
    ) -> Result<Profile, RepositoryError>;

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Profile>, RepositoryError>;

    async fn top_profiles_by_upvotes(&self, limit: u32) -> Result<Vec<Profile>, RepositoryError>;

    /// Profiles with coordinates that have not hidden them.
    async fn located_profiles(&self) -> Result<Vec<Profile>, RepositoryError>;

    async fn increment_profile_views(&self, user_id: &str) -> Result<bool, RepositoryError>;

    /// Write cached rank/badges for many profiles in one transaction.
    /// Returns the number of rows updated.
    async fn store_derived(&self, fields: &[DerivedFields]) -> Result<u64, RepositoryError>;

    /// Advance the activity streak for `today` and return the new value.
    async fn record_activity(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<Option<i64>, RepositoryError>;

    async fn set_location(
        &self,
        user_id: &str,
        location: &Location,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    async fn set_location_hidden(&self, user_id: &str, hidden: bool)
        -> Result<bool, RepositoryError>;

    /// A user's projects, newest first.
    async fn list_projects(&self, user_id: &str) -> Result<Vec<Project>, RepositoryError>;

    /// Owner id of every project, one entry per project.
    async fn list_project_owners(&self) -> Result<Vec<String>, RepositoryError>;

    async fn get_project(&self, id: &str) -> Result<Option<Project>, RepositoryError>;

    async fn insert_project(
        &self,
        user_id: &str,
        project: &NewProject,
        now: DateTime<Utc>,
    ) -> Result<Project, RepositoryError>;

    async fn update_project(
        &self,
        id: &str,
        update: &ProjectUpdate,
    ) -> Result<Option<Project>, RepositoryError>;

    async fn delete_project(&self, id: &str) -> Result<bool, RepositoryError>;

    async fn increment_project_views(&self, id: &str) -> Result<bool, RepositoryError>;

    /// A user's projects created at or after `since`, newest first.
    async fn projects_created_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Project>, RepositoryError>;

    async fn trending_projects(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<TrendingProject>, RepositoryError>;

    async fn has_upvote(
        &self,
        voter_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<bool, RepositoryError>;

    /// Fails with `Conflict` when the voter already upvoted the target.
    async fn insert_upvote(&self, record: &UpvoteRecord) -> Result<(), RepositoryError>;

    /// Returns whether a record was removed.
    async fn delete_upvote(
        &self,
        voter_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<bool, RepositoryError>;

    /// Atomic `upvotes + 1` on the target row. Returns whether the row exists.
    async fn increment_upvotes(
        &self,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<bool, RepositoryError>;

    /// Atomic `upvotes - 1`, never going below zero. Returns whether a row
    /// changed.
    async fn decrement_upvotes(
        &self,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<bool, RepositoryError>;

    /// Upvotes cast by `voter_id` at or after `since`, newest first.
    async fn upvotes_given_since(
        &self,
        voter_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<UpvoteRecord>, RepositoryError>;

    async fn count_upvotes(&self) -> Result<u64, RepositoryError>;

    /// Add `delta` to the user's row for `date`, creating it if needed.
    async fn bump_daily_stat(
        &self,
        user_id: &str,
        date: NaiveDate,
        delta: DailyDelta,
    ) -> Result<(), RepositoryError>;

    /// Rows dated `from` or later, oldest first.
    async fn daily_stats_since(
        &self,
        user_id: &str,
        from: NaiveDate,
    ) -> Result<Vec<DailyStat>, RepositoryError>;

    /// Latest `limit` rows, newest first.
    async fn recent_daily_stats(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<DailyStat>, RepositoryError>;
}

/// Type alias for Arc-wrapped repository (for AppState)
pub type DynRepository = Arc<dyn Repository>;
