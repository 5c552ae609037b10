use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub quote: Option<String>,
    pub bio: String,
    pub avatar: String,
    pub social: SocialLinks,
    pub goal: Option<Goal>,
    pub views: i64,
    pub upvotes: i64,
    pub streak: i64,
    pub badges: Vec<String>,
    pub rank: i64,
    pub last_active_date: Option<NaiveDate>,
    pub hide_location: bool,
    pub location: Option<Location>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub x: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub title: String,
    pub description: String,
    pub started_at: Option<DateTime<Utc>>,
    pub progress_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub city: String,
    pub country: String,
}

/// Fields a user supplies when creating their profile.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
    pub username: String,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub quote: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub social: Option<SocialLinks>,
    pub goal: Option<GoalInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoalInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub progress_percent: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub banner_url: Option<String>,
    pub link: Option<String>,
    pub views: i64,
    pub upvotes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub banner_url: Option<String>,
    pub link: Option<String>,
}

/// A project together with the public identity of its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingProject {
    #[serde(flatten)]
    pub project: Project,
    pub owner_username: String,
    pub owner_display_name: String,
    pub owner_avatar: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Profile,
    Project,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(Self::Profile),
            "project" => Ok(Self::Project),
            other => Err(format!("unknown target type: {}", other)),
        }
    }
}

impl ToSql for TargetType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TargetType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpvoteRecord {
    pub id: String,
    pub voter_id: String,
    pub target_id: String,
    pub target_type: TargetType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub views: i64,
    pub upvotes: i64,
}

/// Increment applied to a user's daily stat row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyDelta {
    pub views: i64,
    pub upvotes: i64,
}

impl DailyDelta {
    pub const VIEW: Self = Self {
        views: 1,
        upvotes: 0,
    };

    pub const UPVOTE: Self = Self {
        views: 0,
        upvotes: 1,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_type_round_trips_through_str() {
        for t in [TargetType::Profile, TargetType::Project] {
            assert_eq!(t.as_str().parse::<TargetType>().unwrap(), t);
        }
        assert!("comment".parse::<TargetType>().is_err());
    }

    #[test]
    fn target_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TargetType::Project).unwrap(),
            "\"project\""
        );
    }

    #[test]
    fn profile_update_accepts_partial_json() {
        let update: ProfileUpdate = serde_json::from_str(r#"{"bio":"hello"}"#).unwrap();
        assert_eq!(update.bio.as_deref(), Some("hello"));
        assert!(update.display_name.is_none());
        assert!(update.goal.is_none());
    }
}
