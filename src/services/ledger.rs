use chrono::Utc;

use crate::db::models::{DailyDelta, TargetType, UpvoteRecord};
use crate::repository::{DynRepository, Repository, RepositoryError};
use crate::services::leaderboard::LeaderboardService;

/// One vote per (voter, target, target type). Every operation answers with a
/// plain bool; store failures are logged, never returned.
#[derive(Clone)]
pub struct UpvoteLedger {
    repo: DynRepository,
    leaderboard: LeaderboardService,
}

impl UpvoteLedger {
    pub fn new(repo: DynRepository, leaderboard: LeaderboardService) -> Self {
        Self { repo, leaderboard }
    }

    pub async fn can_upvote(&self, target_id: &str, voter_id: &str, target_type: TargetType) -> bool {
        match self.repo.has_upvote(voter_id, target_id, target_type).await {
            Ok(exists) => !exists,
            Err(e) => {
                tracing::error!(
                    "Failed to check upvote by {} on {} {}: {}",
                    voter_id,
                    target_type,
                    target_id,
                    e
                );
                false
            }
        }
    }

    /// Record a vote and bump the target's counters. False when the voter
    /// already voted, the target does not exist, or the vote could not be stored.
    pub async fn add_upvote(&self, target_id: &str, voter_id: &str, target_type: TargetType) -> bool {
        if !self.can_upvote(target_id, voter_id, target_type).await {
            return false;
        }

        let now = Utc::now();
        let record = UpvoteRecord {
            id: uuid::Uuid::now_v7().to_string(),
            voter_id: voter_id.to_string(),
            target_id: target_id.to_string(),
            target_type,
            created_at: now,
        };

        match self.repo.insert_upvote(&record).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(msg)) => {
                tracing::debug!("Concurrent duplicate upvote rejected: {}", msg);
                return false;
            }
            Err(e) => {
                tracing::error!("Failed to store upvote on {} {}: {}", target_type, target_id, e);
                return false;
            }
        }

        // The vote is recorded; counter bookkeeping below is best effort
        match self.repo.increment_upvotes(target_id, target_type).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Upvoted {} {} does not exist", target_type, target_id);
                if let Err(e) = self.repo.delete_upvote(voter_id, target_id, target_type).await {
                    tracing::error!("Failed to drop upvote on missing {} {}: {}", target_type, target_id, e);
                }
                return false;
            }
            Err(e) => tracing::warn!("Failed to increment upvotes on {} {}: {}", target_type, target_id, e),
        }

        if target_type == TargetType::Profile {
            if let Err(e) = self
                .repo
                .bump_daily_stat(target_id, now.date_naive(), DailyDelta::UPVOTE)
                .await
            {
                tracing::warn!("Failed to record daily upvote for {}: {}", target_id, e);
            }
            self.refresh_badges(target_id).await;
        }

        true
    }

    /// Withdraw a vote. Removing a vote that was never cast is a no-op that
    /// still succeeds; only a failed delete returns false.
    pub async fn remove_upvote(&self, target_id: &str, voter_id: &str, target_type: TargetType) -> bool {
        let removed = match self.repo.delete_upvote(voter_id, target_id, target_type).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::error!("Failed to remove upvote on {} {}: {}", target_type, target_id, e);
                return false;
            }
        };

        if removed {
            if let Err(e) = self.repo.decrement_upvotes(target_id, target_type).await {
                tracing::warn!("Failed to decrement upvotes on {} {}: {}", target_type, target_id, e);
            }
            if target_type == TargetType::Profile {
                self.refresh_badges(target_id).await;
            }
        }

        true
    }

    pub async fn add_profile_upvote(&self, target_user_id: &str, voter_id: &str) -> bool {
        self.add_upvote(target_user_id, voter_id, TargetType::Profile).await
    }

    pub async fn remove_profile_upvote(&self, target_user_id: &str, voter_id: &str) -> bool {
        self.remove_upvote(target_user_id, voter_id, TargetType::Profile).await
    }

    pub async fn add_project_upvote(&self, project_id: &str, voter_id: &str) -> bool {
        self.add_upvote(project_id, voter_id, TargetType::Project).await
    }

    pub async fn remove_project_upvote(&self, project_id: &str, voter_id: &str) -> bool {
        self.remove_upvote(project_id, voter_id, TargetType::Project).await
    }

    async fn refresh_badges(&self, user_id: &str) {
        if let Err(e) = self.leaderboard.refresh_badges(user_id).await {
            tracing::warn!("Failed to refresh badges for {}: {}", user_id, e);
        }
    }
}
