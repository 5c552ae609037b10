use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::models::{Project, TargetType, UpvoteRecord};

/// One entry of a user's activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityEvent {
    ProjectCreated {
        project_id: String,
        title: String,
        timestamp: DateTime<Utc>,
    },
    UpvoteGiven {
        target_id: String,
        target_type: TargetType,
        timestamp: DateTime<Utc>,
    },
}

impl ActivityEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::ProjectCreated { timestamp, .. } | Self::UpvoteGiven { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

impl From<Project> for ActivityEvent {
    fn from(project: Project) -> Self {
        Self::ProjectCreated {
            project_id: project.id,
            title: project.title,
            timestamp: project.created_at,
        }
    }
}

impl From<UpvoteRecord> for ActivityEvent {
    fn from(upvote: UpvoteRecord) -> Self {
        Self::UpvoteGiven {
            target_id: upvote.target_id,
            target_type: upvote.target_type,
            timestamp: upvote.created_at,
        }
    }
}

/// Newest first. Events with equal timestamps keep their input order,
/// projects before upvotes.
pub fn merge_timeline(projects: Vec<Project>, upvotes: Vec<UpvoteRecord>) -> Vec<ActivityEvent> {
    let mut events: Vec<ActivityEvent> = projects
        .into_iter()
        .map(ActivityEvent::from)
        .chain(upvotes.into_iter().map(ActivityEvent::from))
        .collect();
    events.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    events
}
