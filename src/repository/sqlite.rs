use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::models::{
    DailyDelta, DailyStat, Goal, Location, NewProfile, NewProject, Profile, ProfileUpdate,
    Project, ProjectUpdate, SocialLinks, TargetType, TrendingProject, UpvoteRecord,
};
use crate::ranking::CreatedWindow;
use crate::repository::{DerivedFields, Repository, RepositoryError};
use crate::state::DbPool;

const PROFILE_COLUMNS: &str = "id, user_id, username, display_name, email, quote, bio, avatar, \
     social_x, social_github, social_website, social_linkedin, \
     goal_title, goal_description, goal_started_at, goal_progress_percent, \
     views, upvotes, streak, badges, rank, last_active_date, \
     hide_location, location_lat, location_lng, location_city, location_country, \
     created_at, updated_at";

const PROJECT_COLUMNS: &str =
    "p.id, p.user_id, p.title, p.description, p.banner_url, p.link, p.views, p.upvotes, p.created_at";

const UPVOTE_COLUMNS: &str = "id, voter_id, target_id, target_type, created_at";

const DAILY_STAT_COLUMNS: &str = "id, user_id, date, views, upvotes";

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    let badges_json: String = row.get(19)?;
    let badges: Vec<String> = serde_json::from_str(&badges_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(19, Type::Text, Box::new(e)))?;

    let goal = match row.get::<_, Option<String>>(12)? {
        Some(title) => Some(Goal {
            title,
            description: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
            started_at: row.get(14)?,
            progress_percent: row.get::<_, Option<i64>>(15)?.unwrap_or(0).clamp(0, 100) as u8,
        }),
        None => None,
    };

    let location = match (row.get::<_, Option<f64>>(23)?, row.get::<_, Option<f64>>(24)?) {
        (Some(lat), Some(lng)) => Some(Location {
            lat,
            lng,
            city: row.get::<_, Option<String>>(25)?.unwrap_or_default(),
            country: row.get::<_, Option<String>>(26)?.unwrap_or_default(),
        }),
        _ => None,
    };

    Ok(Profile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        display_name: row.get(3)?,
        email: row.get(4)?,
        quote: row.get(5)?,
        bio: row.get(6)?,
        avatar: row.get(7)?,
        social: SocialLinks {
            x: row.get(8)?,
            github: row.get(9)?,
            website: row.get(10)?,
            linkedin: row.get(11)?,
        },
        goal,
        views: row.get(16)?,
        upvotes: row.get(17)?,
        streak: row.get(18)?,
        badges,
        rank: row.get(20)?,
        last_active_date: row.get(21)?,
        hide_location: row.get(22)?,
        location,
        created_at: row.get(27)?,
        updated_at: row.get(28)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        banner_url: row.get(4)?,
        link: row.get(5)?,
        views: row.get(6)?,
        upvotes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn upvote_from_row(row: &Row<'_>) -> rusqlite::Result<UpvoteRecord> {
    Ok(UpvoteRecord {
        id: row.get(0)?,
        voter_id: row.get(1)?,
        target_id: row.get(2)?,
        target_type: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn daily_stat_from_row(row: &Row<'_>) -> rusqlite::Result<DailyStat> {
    Ok(DailyStat {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: row.get(2)?,
        views: row.get(3)?,
        upvotes: row.get(4)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Table and key column holding a target's upvote counter.
fn counter_row(target_type: TargetType) -> (&'static str, &'static str) {
    match target_type {
        TargetType::Profile => ("profiles", "user_id"),
        TargetType::Project => ("projects", "id"),
    }
}

fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// SQLite implementation
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn query_profile(
        &self,
        filter: &str,
        value: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM profiles WHERE {} = ?1", PROFILE_COLUMNS, filter);
        Ok(conn
            .query_row(&sql, params![value], profile_from_row)
            .optional()?)
    }

    fn query_profiles(&self, sql: &str) -> Result<Vec<Profile>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let profiles = stmt
            .query_map([], profile_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn list_profiles(
        &self,
        created: Option<CreatedWindow>,
    ) -> Result<Vec<Profile>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM profiles
             WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2)
             ORDER BY created_at ASC, id ASC",
            PROFILE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let profiles = stmt
            .query_map(
                params![created.map(|w| w.start), created.map(|w| w.end)],
                profile_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, RepositoryError> {
        self.query_profile("user_id", user_id)
    }

    async fn get_profile_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        self.query_profile("username", username)
    }

    async fn insert_profile(
        &self,
        user_id: &str,
        profile: &NewProfile,
        now: DateTime<Utc>,
    ) -> Result<Profile, RepositoryError> {
        {
            let conn = self.pool.get()?;
            conn.execute(
                "INSERT INTO profiles (id, user_id, username, display_name, email, quote, bio, avatar, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    new_id(),
                    user_id,
                    profile.username,
                    profile.display_name,
                    profile.email,
                    profile.quote,
                    profile.bio.clone().unwrap_or_default(),
                    profile.avatar.clone().unwrap_or_default(),
                    now,
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::Conflict(format!(
                        "profile for user '{}' or username '{}' already exists",
                        user_id, profile.username
                    ))
                } else {
                    e.into()
                }
            })?;
        }

        self.get_profile(user_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(user_id.to_string()))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Profile>, RepositoryError> {
        let updated = {
            let conn = self.pool.get()?;

            conn.execute("BEGIN IMMEDIATE", [])?;

            let result: Result<bool, RepositoryError> = (|| {
                let rows = conn.execute(
                    "UPDATE profiles SET
                       display_name = COALESCE(?2, display_name),
                       quote = COALESCE(?3, quote),
                       bio = COALESCE(?4, bio),
                       avatar = COALESCE(?5, avatar),
                       updated_at = ?6
                     WHERE user_id = ?1",
                    params![
                        user_id,
                        update.display_name,
                        update.quote,
                        update.bio,
                        update.avatar,
                        now
                    ],
                )?;
                if rows == 0 {
                    return Ok(false);
                }

                if let Some(ref social) = update.social {
                    conn.execute(
                        "UPDATE profiles SET social_x = ?2, social_github = ?3,
                           social_website = ?4, social_linkedin = ?5
                         WHERE user_id = ?1",
                        params![
                            user_id,
                            social.x,
                            social.github,
                            social.website,
                            social.linkedin
                        ],
                    )?;
                }

                if let Some(ref goal) = update.goal {
                    // A new goal title restarts the goal clock
                    conn.execute(
                        "UPDATE profiles SET
                           goal_started_at = CASE WHEN goal_title IS ?2 THEN goal_started_at ELSE ?5 END,
                           goal_title = ?2,
                           goal_description = ?3,
                           goal_progress_percent = ?4
                         WHERE user_id = ?1",
                        params![
                            user_id,
                            goal.title,
                            goal.description,
                            goal.progress_percent,
                            now
                        ],
                    )?;
                }

                Ok(true)
            })();

            match result {
                Ok(updated) => {
                    conn.execute("COMMIT", [])?;
                    updated
                }
                Err(e) => {
                    conn.execute("ROLLBACK", [])?;
                    return Err(e);
                }
            }
        };

        if !updated {
            return Ok(None);
        }
        self.get_profile(user_id).await
    }

    async fn top_profiles_by_upvotes(&self, limit: u32) -> Result<Vec<Profile>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM profiles ORDER BY upvotes DESC, created_at ASC, id ASC LIMIT ?1",
            PROFILE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let profiles = stmt
            .query_map(params![limit], profile_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    async fn located_profiles(&self) -> Result<Vec<Profile>, RepositoryError> {
        self.query_profiles(&format!(
            "SELECT {} FROM profiles
             WHERE location_lat IS NOT NULL AND location_lng IS NOT NULL AND hide_location = 0
             ORDER BY created_at ASC, id ASC",
            PROFILE_COLUMNS
        ))
    }

    async fn increment_profile_views(&self, user_id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE profiles SET views = views + 1 WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(rows > 0)
    }

    async fn store_derived(&self, fields: &[DerivedFields]) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let mut updated = 0u64;
        {
            let mut stmt = tx.prepare(
                "UPDATE profiles SET rank = COALESCE(?2, rank), badges = ?3 WHERE user_id = ?1",
            )?;
            for field in fields {
                let badges = serde_json::to_string(&field.badges)?;
                updated += stmt.execute(params![field.user_id, field.rank, badges])? as u64;
            }
        }
        tx.commit()?;
        Ok(updated)
    }

    async fn record_activity(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<Option<i64>, RepositoryError> {
        let conn = self.pool.get()?;
        let yesterday = today - Duration::days(1);
        let streak = conn
            .query_row(
                "UPDATE profiles SET
                   streak = CASE
                     WHEN last_active_date = ?2 THEN streak
                     WHEN last_active_date = ?3 THEN streak + 1
                     ELSE 1
                   END,
                   last_active_date = ?2
                 WHERE user_id = ?1
                 RETURNING streak",
                params![user_id, today, yesterday],
                |row| row.get(0),
            )
            .optional()?;
        Ok(streak)
    }

    async fn set_location(
        &self,
        user_id: &str,
        location: &Location,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE profiles SET location_lat = ?2, location_lng = ?3, location_city = ?4,
               location_country = ?5, updated_at = ?6
             WHERE user_id = ?1",
            params![
                user_id,
                location.lat,
                location.lng,
                location.city,
                location.country,
                now
            ],
        )?;
        Ok(rows > 0)
    }

    async fn set_location_hidden(
        &self,
        user_id: &str,
        hidden: bool,
    ) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE profiles SET hide_location = ?2 WHERE user_id = ?1",
            params![user_id, hidden],
        )?;
        Ok(rows > 0)
    }

    async fn list_projects(&self, user_id: &str) -> Result<Vec<Project>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM projects p WHERE p.user_id = ?1 ORDER BY p.created_at DESC, p.id DESC",
            PROJECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let projects = stmt
            .query_map(params![user_id], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    async fn list_project_owners(&self) -> Result<Vec<String>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT user_id FROM projects")?;
        let owners = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(owners)
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM projects p WHERE p.id = ?1", PROJECT_COLUMNS);
        Ok(conn
            .query_row(&sql, params![id], project_from_row)
            .optional()?)
    }

    async fn insert_project(
        &self,
        user_id: &str,
        project: &NewProject,
        now: DateTime<Utc>,
    ) -> Result<Project, RepositoryError> {
        let id = new_id();
        {
            let conn = self.pool.get()?;
            conn.execute(
                "INSERT INTO projects (id, user_id, title, description, banner_url, link, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    user_id,
                    project.title,
                    project.description,
                    project.banner_url,
                    project.link,
                    now
                ],
            )?;
        }

        self.get_project(&id)
            .await?
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn update_project(
        &self,
        id: &str,
        update: &ProjectUpdate,
    ) -> Result<Option<Project>, RepositoryError> {
        let rows = {
            let conn = self.pool.get()?;
            conn.execute(
                "UPDATE projects SET
                   title = COALESCE(?2, title),
                   description = COALESCE(?3, description),
                   banner_url = COALESCE(?4, banner_url),
                   link = COALESCE(?5, link)
                 WHERE id = ?1",
                params![
                    id,
                    update.title,
                    update.description,
                    update.banner_url,
                    update.link
                ],
            )?
        };

        if rows == 0 {
            return Ok(None);
        }
        self.get_project(id).await
    }

    async fn delete_project(&self, id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    async fn increment_project_views(&self, id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE projects SET views = views + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(rows > 0)
    }

    async fn projects_created_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Project>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM projects p
             WHERE p.user_id = ?1 AND p.created_at >= ?2
             ORDER BY p.created_at DESC, p.id DESC",
            PROJECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let projects = stmt
            .query_map(params![user_id, since], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    async fn trending_projects(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<TrendingProject>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {}, pr.username, pr.display_name, pr.avatar
             FROM projects p JOIN profiles pr ON pr.user_id = p.user_id
             WHERE p.created_at >= ?1
             ORDER BY p.upvotes DESC, p.created_at DESC
             LIMIT ?2",
            PROJECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let projects = stmt
            .query_map(params![since, limit], |row| {
                Ok(TrendingProject {
                    project: project_from_row(row)?,
                    owner_username: row.get(9)?,
                    owner_display_name: row.get(10)?,
                    owner_avatar: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    async fn has_upvote(
        &self,
        voter_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let exists = conn.query_row(
            "SELECT EXISTS(
               SELECT 1 FROM upvotes WHERE voter_id = ?1 AND target_id = ?2 AND target_type = ?3
             )",
            params![voter_id, target_id, target_type],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    async fn insert_upvote(&self, record: &UpvoteRecord) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO upvotes (id, voter_id, target_id, target_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.voter_id,
                record.target_id,
                record.target_type,
                record.created_at
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Conflict(format!(
                    "{} already upvoted {} {}",
                    record.voter_id, record.target_type, record.target_id
                ))
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    async fn delete_upvote(
        &self,
        voter_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "DELETE FROM upvotes WHERE voter_id = ?1 AND target_id = ?2 AND target_type = ?3",
            params![voter_id, target_id, target_type],
        )?;
        Ok(rows > 0)
    }

    async fn increment_upvotes(
        &self,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<bool, RepositoryError> {
        let (table, key) = counter_row(target_type);
        let conn = self.pool.get()?;
        let rows = conn.execute(
            &format!("UPDATE {} SET upvotes = upvotes + 1 WHERE {} = ?1", table, key),
            params![target_id],
        )?;
        Ok(rows > 0)
    }

    async fn decrement_upvotes(
        &self,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<bool, RepositoryError> {
        let (table, key) = counter_row(target_type);
        let conn = self.pool.get()?;
        let rows = conn.execute(
            &format!(
                "UPDATE {} SET upvotes = upvotes - 1 WHERE {} = ?1 AND upvotes > 0",
                table, key
            ),
            params![target_id],
        )?;
        Ok(rows > 0)
    }

    async fn upvotes_given_since(
        &self,
        voter_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<UpvoteRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM upvotes WHERE voter_id = ?1 AND created_at >= ?2
             ORDER BY created_at DESC, id DESC",
            UPVOTE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let upvotes = stmt
            .query_map(params![voter_id, since], upvote_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(upvotes)
    }

    async fn count_upvotes(&self) -> Result<u64, RepositoryError> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM upvotes", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    async fn bump_daily_stat(
        &self,
        user_id: &str,
        date: NaiveDate,
        delta: DailyDelta,
    ) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO daily_stats (id, user_id, date, views, upvotes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id, date) DO UPDATE SET
               views = views + excluded.views,
               upvotes = upvotes + excluded.upvotes",
            params![
                new_id(),
                user_id,
                date,
                delta.views,
                delta.upvotes,
                Utc::now()
            ],
        )?;
        Ok(())
    }

    async fn daily_stats_since(
        &self,
        user_id: &str,
        from: NaiveDate,
    ) -> Result<Vec<DailyStat>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM daily_stats WHERE user_id = ?1 AND date >= ?2 ORDER BY date ASC",
            DAILY_STAT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let stats = stmt
            .query_map(params![user_id, from], daily_stat_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stats)
    }

    async fn recent_daily_stats(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<DailyStat>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM daily_stats WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2",
            DAILY_STAT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let stats = stmt
            .query_map(params![user_id, limit], daily_stat_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stats)
    }
}
