// Pure ranking logic: no storage, no clocks
pub mod badges;
pub mod growth;
pub mod leaderboard;
pub mod score;
pub mod timeline;

pub use badges::{badge_labels, derive_badges, Badge};
pub use growth::{GrowthRate, GrowthWindows};
pub use leaderboard::{count_projects, rank_profiles, CreatedWindow, LeaderboardEntry, SortBy};
pub use score::{score, Metrics};
pub use timeline::{merge_timeline, ActivityEvent};
