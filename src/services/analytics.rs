use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::config::AnalyticsConfig;
use crate::db::models::{DailyStat, Profile, Project, TrendingProject};
use crate::error::AppResult;
use crate::ranking::{merge_timeline, ActivityEvent, CreatedWindow, GrowthRate, GrowthWindows};
use crate::repository::{DynRepository, Repository, RepositoryError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalytics {
    pub profile: ProfileSummary,
    pub projects: ProjectSummary,
    pub daily_stats: Vec<DailyStat>,
    pub total_engagement: Engagement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub views: i64,
    pub upvotes: i64,
    pub streak: i64,
    pub badges: Vec<String>,
    pub rank: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub total: usize,
    pub total_views: i64,
    pub total_upvotes: i64,
    pub list: Vec<Project>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Engagement {
    pub views: i64,
    pub upvotes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAnalytics {
    pub users: UserTotals,
    pub projects: ProjectTotals,
    pub engagement: GlobalEngagement,
    pub geography: Geography,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTotals {
    pub total: usize,
    pub new_this_week: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectTotals {
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalEngagement {
    pub total_views: i64,
    pub total_upvotes: u64,
    pub total_profile_upvotes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Geography {
    pub top_countries: Vec<CountryCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
}

/// Count profiles per non-empty country. Highest count first, ties by name.
pub fn top_countries(profiles: &[Profile], limit: usize) -> Vec<CountryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for location in profiles.iter().filter_map(|p| p.location.as_ref()) {
        if !location.country.is_empty() {
            *counts.entry(location.country.as_str()).or_insert(0) += 1;
        }
    }

    let mut countries: Vec<CountryCount> = counts
        .into_iter()
        .map(|(country, count)| CountryCount {
            country: country.to_string(),
            count,
        })
        .collect();
    countries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.country.cmp(&b.country)));
    countries.truncate(limit);
    countries
}

/// Longest look-back honoured by the `days` query parameters.
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

fn lookback(days: i64) -> Duration {
    Duration::days(days.clamp(0, MAX_LOOKBACK_DAYS))
}

#[derive(Clone)]
pub struct AnalyticsService {
    repo: DynRepository,
    settings: AnalyticsConfig,
}

impl AnalyticsService {
    pub fn new(repo: DynRepository, settings: AnalyticsConfig) -> Self {
        Self { repo, settings }
    }

    /// Per-user dashboard. `None` for unknown users and on store failure.
    pub async fn user_analytics(&self, user_id: &str) -> Option<UserAnalytics> {
        match self.collect_user_analytics(user_id).await {
            Ok(analytics) => analytics,
            Err(e) => {
                tracing::error!("Failed to load analytics for {}: {}", user_id, e);
                None
            }
        }
    }

    async fn collect_user_analytics(
        &self,
        user_id: &str,
    ) -> Result<Option<UserAnalytics>, RepositoryError> {
        let Some(profile) = self.repo.get_profile(user_id).await? else {
            return Ok(None);
        };
        let projects = self.repo.list_projects(user_id).await?;
        let daily_stats = self
            .repo
            .recent_daily_stats(user_id, self.settings.recent_stats_limit)
            .await?;

        let total_views: i64 = projects.iter().map(|p| p.views).sum();
        let total_upvotes: i64 = projects.iter().map(|p| p.upvotes).sum();

        Ok(Some(UserAnalytics {
            total_engagement: Engagement {
                views: profile.views + total_views,
                upvotes: profile.upvotes + total_upvotes,
            },
            profile: ProfileSummary {
                views: profile.views,
                upvotes: profile.upvotes,
                streak: profile.streak,
                badges: profile.badges,
                rank: profile.rank,
            },
            projects: ProjectSummary {
                total: projects.len(),
                total_views,
                total_upvotes,
                list: projects,
            },
            daily_stats,
        }))
    }

    /// Daily rows from `days` ago through today, oldest first.
    pub async fn daily_stats(&self, user_id: &str, days: Option<i64>) -> AppResult<Vec<DailyStat>> {
        let days = days.unwrap_or(self.settings.daily_stats_days);
        let from = Utc::now().date_naive() - lookback(days);
        Ok(self.repo.daily_stats_since(user_id, from).await?)
    }

    pub async fn growth_rate(&self, user_id: &str) -> GrowthRate {
        self.growth_rate_at(user_id, Utc::now().date_naive()).await
    }

    pub async fn growth_rate_at(&self, user_id: &str, today: NaiveDate) -> GrowthRate {
        let windows = GrowthWindows::ending(today, self.settings.growth_window_days);
        match self.repo.daily_stats_since(user_id, windows.first_start).await {
            Ok(stats) => GrowthRate::from_stats(&stats, &windows),
            Err(e) => {
                tracing::error!("Failed to load growth stats for {}: {}", user_id, e);
                GrowthRate::default()
            }
        }
    }

    pub async fn activity_timeline(
        &self,
        user_id: &str,
        days: Option<i64>,
        limit: Option<usize>,
    ) -> Vec<ActivityEvent> {
        self.activity_timeline_at(user_id, days, limit, Utc::now()).await
    }

    /// Projects created and upvotes given in the last `days`, newest first.
    pub async fn activity_timeline_at(
        &self,
        user_id: &str,
        days: Option<i64>,
        limit: Option<usize>,
        now: DateTime<Utc>,
    ) -> Vec<ActivityEvent> {
        let since = now - lookback(days.unwrap_or(self.settings.timeline_days));

        let sources = async {
            let projects = self.repo.projects_created_since(user_id, since).await?;
            let upvotes = self.repo.upvotes_given_since(user_id, since).await?;
            Ok::<_, RepositoryError>((projects, upvotes))
        };

        match sources.await {
            Ok((projects, upvotes)) => {
                let mut events = merge_timeline(projects, upvotes);
                if let Some(limit) = limit {
                    events.truncate(limit);
                }
                events
            }
            Err(e) => {
                tracing::error!("Failed to load activity for {}: {}", user_id, e);
                Vec::new()
            }
        }
    }

    pub async fn global_analytics(&self) -> AppResult<GlobalAnalytics> {
        self.global_analytics_at(Utc::now()).await
    }

    pub async fn global_analytics_at(&self, now: DateTime<Utc>) -> AppResult<GlobalAnalytics> {
        let profiles = self.repo.list_profiles(None).await?;
        let project_total = self.repo.list_project_owners().await?.len();
        let upvote_total = self.repo.count_upvotes().await?;

        let this_week = CreatedWindow::trailing(now, 7);
        let new_this_week = profiles
            .iter()
            .filter(|p| this_week.contains(p.created_at))
            .count();

        Ok(GlobalAnalytics {
            users: UserTotals {
                total: profiles.len(),
                new_this_week,
            },
            projects: ProjectTotals {
                total: project_total,
            },
            engagement: GlobalEngagement {
                total_views: profiles.iter().map(|p| p.views).sum(),
                total_upvotes: upvote_total,
                total_profile_upvotes: profiles.iter().map(|p| p.upvotes).sum(),
            },
            geography: Geography {
                top_countries: top_countries(&profiles, self.settings.top_countries),
            },
        })
    }

    pub async fn trending_projects(&self, limit: Option<u32>) -> AppResult<Vec<TrendingProject>> {
        self.trending_projects_at(limit, Utc::now()).await
    }

    pub async fn trending_projects_at(
        &self,
        limit: Option<u32>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<TrendingProject>> {
        let since = now - Duration::days(self.settings.trending_window_days);
        let limit = limit.unwrap_or(self.settings.trending_limit);
        Ok(self.repo.trending_projects(since, limit).await?)
    }
}
