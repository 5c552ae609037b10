// Application services - combine pure ranking logic with repository side effects
pub mod analytics;
pub mod leaderboard;
pub mod ledger;
pub mod profiles;

pub use analytics::{AnalyticsService, GlobalAnalytics, UserAnalytics};
pub use leaderboard::{FeaturedBuilder, LeaderboardService};
pub use ledger::UpvoteLedger;
pub use profiles::{LocationInput, MapPin, ProfileDetail, ProfileService};
