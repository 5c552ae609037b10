use serde::{Deserialize, Serialize};

use crate::db::models::Profile;

pub const UPVOTE_WEIGHT: u64 = 40;
pub const VIEW_WEIGHT: u64 = 30;
pub const STREAK_WEIGHT: u64 = 20;

/// The three counters that drive scoring and badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default)]
    pub upvotes: u64,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub streak: u64,
}

impl Metrics {
    pub fn new(upvotes: u64, views: u64, streak: u64) -> Self {
        Self {
            upvotes,
            views,
            streak,
        }
    }

    /// Stored counters are signed; anything below zero reads as zero.
    pub fn from_counters(upvotes: i64, views: i64, streak: i64) -> Self {
        Self::new(clamp(upvotes), clamp(views), clamp(streak))
    }

    pub fn of(profile: &Profile) -> Self {
        Self::from_counters(profile.upvotes, profile.views, profile.streak)
    }

    /// True when every counter is at least the other's.
    pub fn dominates(&self, other: &Metrics) -> bool {
        self.upvotes >= other.upvotes && self.views >= other.views && self.streak >= other.streak
    }
}

fn clamp(value: i64) -> u64 {
    value.max(0) as u64
}

/// Weighted linear score used to order the leaderboard.
pub fn score(metrics: &Metrics) -> u64 {
    metrics
        .upvotes
        .saturating_mul(UPVOTE_WEIGHT)
        .saturating_add(metrics.views.saturating_mul(VIEW_WEIGHT))
        .saturating_add(metrics.streak.saturating_mul(STREAK_WEIGHT))
}
