use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::config::LocationConfig;
use crate::db::models::{
    DailyDelta, Location, NewProfile, NewProject, Profile, ProfileUpdate, Project, ProjectUpdate,
};
use crate::error::{AppError, AppResult};
use crate::repository::{DynRepository, Repository};

/// A profile together with its projects, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileDetail {
    #[serde(flatten)]
    pub profile: Profile,
    pub projects: Vec<Project>,
}

/// Location as submitted by the user, before jitter.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

/// Public marker for the builder map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPin {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
    pub location: Location,
}

/// Move a coordinate to a uniformly random point within `radius` degrees.
pub fn jitter<R: Rng>(lat: f64, lng: f64, radius: f64, rng: &mut R) -> (f64, f64) {
    // sqrt gives uniform density over the disc
    let distance = radius * rng.gen::<f64>().sqrt();
    let angle = rng.gen::<f64>() * 2.0 * PI;
    (
        (lat + distance * angle.sin()).clamp(-90.0, 90.0),
        (lng + distance * angle.cos()).clamp(-180.0, 180.0),
    )
}

fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ProfileService {
    repo: DynRepository,
    settings: LocationConfig,
}

impl ProfileService {
    pub fn new(repo: DynRepository, settings: LocationConfig) -> Self {
        Self { repo, settings }
    }

    pub async fn create(&self, user_id: &str, profile: NewProfile) -> AppResult<Profile> {
        require_non_empty("username", &profile.username)?;
        require_non_empty("display_name", &profile.display_name)?;

        let created = self.repo.insert_profile(user_id, &profile, Utc::now()).await?;
        tracing::info!("Created profile {} for {}", created.username, user_id);
        Ok(created)
    }

    pub async fn get(&self, user_id: &str) -> AppResult<ProfileDetail> {
        let profile = self
            .repo
            .get_profile(user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.with_projects(profile).await
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<ProfileDetail> {
        let profile = self
            .repo
            .get_profile_by_username(username)
            .await?
            .ok_or(AppError::NotFound)?;
        self.with_projects(profile).await
    }

    async fn with_projects(&self, profile: Profile) -> AppResult<ProfileDetail> {
        let projects = self.repo.list_projects(&profile.user_id).await?;
        Ok(ProfileDetail { profile, projects })
    }

    pub async fn update(&self, user_id: &str, update: ProfileUpdate) -> AppResult<Profile> {
        if let Some(ref goal) = update.goal {
            require_non_empty("goal title", &goal.title)?;
            if !(0..=100).contains(&goal.progress_percent) {
                return Err(AppError::BadRequest(
                    "goal progress must be between 0 and 100".into(),
                ));
            }
        }
        if let Some(ref name) = update.display_name {
            require_non_empty("display_name", name)?;
        }

        self.repo
            .update_profile(user_id, &update, Utc::now())
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Count a profile view. False when the profile does not exist or the
    /// view could not be stored.
    pub async fn increment_profile_views(&self, user_id: &str) -> bool {
        match self.repo.increment_profile_views(user_id).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                tracing::error!("Failed to count view for {}: {}", user_id, e);
                return false;
            }
        }

        if let Err(e) = self
            .repo
            .bump_daily_stat(user_id, Utc::now().date_naive(), DailyDelta::VIEW)
            .await
        {
            tracing::warn!("Failed to record daily view for {}: {}", user_id, e);
        }
        true
    }

    /// Mark the user active today and return the updated streak.
    pub async fn record_activity(&self, user_id: &str) -> AppResult<i64> {
        let streak = self
            .repo
            .record_activity(user_id, Utc::now().date_naive())
            .await?
            .ok_or(AppError::NotFound)?;
        tracing::debug!("Activity streak for {} is {}", user_id, streak);
        Ok(streak)
    }

    /// Store a jittered copy of the submitted location.
    pub async fn update_location(&self, user_id: &str, input: LocationInput) -> AppResult<Location> {
        if !(-90.0..=90.0).contains(&input.lat) {
            return Err(AppError::BadRequest("lat must be between -90 and 90".into()));
        }
        if !(-180.0..=180.0).contains(&input.lng) {
            return Err(AppError::BadRequest("lng must be between -180 and 180".into()));
        }

        let (lat, lng) = jitter(
            input.lat,
            input.lng,
            self.settings.jitter_degrees,
            &mut rand::thread_rng(),
        );
        let location = Location {
            lat,
            lng,
            city: input.city,
            country: input.country,
        };

        if !self.repo.set_location(user_id, &location, Utc::now()).await? {
            return Err(AppError::NotFound);
        }
        Ok(location)
    }

    pub async fn set_location_hidden(&self, user_id: &str, hidden: bool) -> AppResult<()> {
        if !self.repo.set_location_hidden(user_id, hidden).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn users_with_locations(&self) -> AppResult<Vec<MapPin>> {
        let profiles = self.repo.located_profiles().await?;
        Ok(profiles
            .into_iter()
            .filter_map(|p| {
                let location = p.location?;
                Some(MapPin {
                    user_id: p.user_id,
                    username: p.username,
                    display_name: p.display_name,
                    avatar: p.avatar,
                    location,
                })
            })
            .collect())
    }

    pub async fn list_projects(&self, user_id: &str) -> AppResult<Vec<Project>> {
        Ok(self.repo.list_projects(user_id).await?)
    }

    pub async fn add_project(&self, user_id: &str, project: NewProject) -> AppResult<Project> {
        require_non_empty("title", &project.title)?;
        if self.repo.get_profile(user_id).await?.is_none() {
            return Err(AppError::BadRequest(
                "create a profile before adding projects".into(),
            ));
        }
        Ok(self.repo.insert_project(user_id, &project, Utc::now()).await?)
    }

    pub async fn update_project(
        &self,
        user_id: &str,
        project_id: &str,
        update: ProjectUpdate,
    ) -> AppResult<Project> {
        if let Some(ref title) = update.title {
            require_non_empty("title", title)?;
        }
        self.owned_project(user_id, project_id).await?;
        self.repo
            .update_project(project_id, &update)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn delete_project(&self, user_id: &str, project_id: &str) -> AppResult<()> {
        self.owned_project(user_id, project_id).await?;
        if !self.repo.delete_project(project_id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn increment_project_views(&self, project_id: &str) -> bool {
        match self.repo.increment_project_views(project_id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!("Failed to count view for project {}: {}", project_id, e);
                false
            }
        }
    }

    async fn owned_project(&self, user_id: &str, project_id: &str) -> AppResult<Project> {
        let project = self
            .repo
            .get_project(project_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if project.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(project)
    }
}
