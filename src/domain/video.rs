use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata record for a single video. Created before any upload happens;
/// uploads only ever rewrite the URL fields and `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVideoParams {
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
}

/// Which URL slot of a record an upload publishes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlField {
    Thumbnail,
    Video,
}

impl VideoRecord {
    pub fn new(params: CreateVideoParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            created_at: now,
            updated_at: now,
            title: params.title,
            description: params.description,
            thumbnail_url: None,
            video_url: None,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Builds the replacement record: everything is carried over except the
    /// targeted URL slot and the update timestamp.
    pub fn with_url(&self, field: UrlField, url: String, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        match field {
            UrlField::Thumbnail => next.thumbnail_url = Some(url),
            UrlField::Video => next.video_url = Some(url),
        }
        next.updated_at = now;
        next
    }
}
