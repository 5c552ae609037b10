use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::LeaderboardConfig;
use crate::db::models::Profile;
use crate::error::AppResult;
use crate::ranking::{badge_labels, count_projects, rank_profiles, LeaderboardEntry, Metrics, SortBy};
use crate::repository::{DerivedFields, DynRepository, Repository, RepositoryError};

/// A top builder on the front page.
#[derive(Debug, Clone, Serialize)]
pub struct FeaturedBuilder {
    #[serde(flatten)]
    pub profile: Profile,
    pub project_count: u32,
}

#[derive(Clone)]
pub struct LeaderboardService {
    repo: DynRepository,
    settings: LeaderboardConfig,
}

impl LeaderboardService {
    pub fn new(repo: DynRepository, settings: LeaderboardConfig) -> Self {
        Self { repo, settings }
    }

    /// Ranked leaderboard. Store failures are logged and yield an empty board.
    pub async fn leaderboard(&self, sort_by: SortBy) -> Vec<LeaderboardEntry> {
        self.leaderboard_at(sort_by, Utc::now()).await
    }

    pub async fn leaderboard_at(&self, sort_by: SortBy, now: DateTime<Utc>) -> Vec<LeaderboardEntry> {
        match self.build(sort_by, now).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Failed to build {:?} leaderboard: {}", sort_by, e);
                Vec::new()
            }
        }
    }

    async fn build(
        &self,
        sort_by: SortBy,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>, RepositoryError> {
        let window = sort_by.candidate_window(now, self.settings.newcomer_window_days);
        let profiles = self.repo.list_profiles(window).await?;
        let owners = self.repo.list_project_owners().await?;
        let counts = count_projects(owners.iter().map(String::as_str));
        Ok(rank_profiles(profiles, &counts))
    }

    /// Recompute every profile's rank and badges and store them.
    pub async fn refresh_derived(&self) -> AppResult<u64> {
        let entries = self.build(SortBy::AllTime, Utc::now()).await?;
        let fields: Vec<DerivedFields> = entries
            .iter()
            .map(|entry| DerivedFields {
                user_id: entry.user_id.clone(),
                rank: Some(i64::from(entry.rank)),
                badges: badge_labels(&Metrics::from_counters(
                    entry.upvotes,
                    entry.views,
                    entry.streak,
                )),
            })
            .collect();

        let updated = self.repo.store_derived(&fields).await?;
        tracing::info!("Refreshed rank and badges for {} profiles", updated);
        Ok(updated)
    }

    /// Badges a profile currently qualifies for, without storing them.
    pub async fn badges(&self, user_id: &str) -> AppResult<Option<Vec<String>>> {
        Ok(self
            .repo
            .get_profile(user_id)
            .await?
            .map(|profile| badge_labels(&Metrics::of(&profile))))
    }

    /// Re-derive and store one profile's badges. `None` when the profile
    /// does not exist.
    pub async fn refresh_badges(&self, user_id: &str) -> AppResult<Option<Vec<String>>> {
        let Some(badges) = self.badges(user_id).await? else {
            return Ok(None);
        };

        self.repo
            .store_derived(&[DerivedFields {
                user_id: user_id.to_string(),
                rank: None,
                badges: badges.clone(),
            }])
            .await?;
        Ok(Some(badges))
    }

    pub async fn featured_builders(&self) -> AppResult<Vec<FeaturedBuilder>> {
        let profiles = self
            .repo
            .top_profiles_by_upvotes(self.settings.featured_count)
            .await?;
        let owners = self.repo.list_project_owners().await?;
        let counts = count_projects(owners.iter().map(String::as_str));

        Ok(profiles
            .into_iter()
            .map(|profile| FeaturedBuilder {
                project_count: counts.get(profile.user_id.as_str()).copied().unwrap_or(0),
                profile,
            })
            .collect())
    }
}
