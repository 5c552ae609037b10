use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::models::Profile;
use crate::ranking::score::{score, Metrics};

/// Leaderboard view requested by the caller. Only `Newcomers` narrows the
/// candidate set; the other views rank every profile by the same score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    Today,
    Yesterday,
    #[default]
    AllTime,
    Newcomers,
}

/// Half-open `[start, end)` interval of creation times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CreatedWindow {
    pub fn trailing(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now - Duration::days(days),
            end: now,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

impl SortBy {
    pub fn candidate_window(&self, now: DateTime<Utc>, newcomer_days: i64) -> Option<CreatedWindow> {
        match self {
            Self::Newcomers => Some(CreatedWindow::trailing(now, newcomer_days)),
            Self::Today | Self::Yesterday | Self::AllTime => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
    pub email: String,
    pub rank: u32,
    pub score: u64,
    pub views: i64,
    pub upvotes: i64,
    pub streak: i64,
    pub badges: Vec<String>,
    pub project_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Single pass over project owner ids.
pub fn count_projects<'a, I>(owner_ids: I) -> HashMap<&'a str, u32>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = HashMap::new();
    for owner in owner_ids {
        *counts.entry(owner).or_insert(0) += 1;
    }
    counts
}

/// Score, order and rank profiles.
///
/// Profiles are expected in fetch order; equal scores keep that order because
/// the sort is stable. Ranks are positions, so ties never share a rank.
pub fn rank_profiles(profiles: Vec<Profile>, project_counts: &HashMap<&str, u32>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = profiles
        .into_iter()
        .map(|profile| {
            let project_count = project_counts
                .get(profile.user_id.as_str())
                .copied()
                .unwrap_or(0);
            LeaderboardEntry {
                score: score(&Metrics::of(&profile)),
                rank: 0,
                project_count,
                user_id: profile.user_id,
                username: profile.username,
                display_name: profile.display_name,
                avatar: profile.avatar,
                email: profile.email,
                views: profile.views,
                upvotes: profile.upvotes,
                streak: profile.streak,
                badges: profile.badges,
                created_at: profile.created_at,
            }
        })
        .collect();

    entries.sort_by(|a, b| b.score.cmp(&a.score));

    for (position, entry) in entries.iter_mut().enumerate() {
        entry.rank = position as u32 + 1;
    }

    entries
}
