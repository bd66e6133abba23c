use crate::domain::video::{UrlField, VideoRecord};
use crate::error::UploadError;
use crate::ports::repository::VideoRepository;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Ownership check plus field-isolated record rewrite.
#[derive(Clone)]
pub struct MetadataUpdater {
    repo: Arc<dyn VideoRepository>,
}

impl MetadataUpdater {
    pub fn new(repo: Arc<dyn VideoRepository>) -> Self {
        Self { repo }
    }

    /// Fetches the record and confirms `user_id` owns it.
    pub async fn authorize(&self, video_id: Uuid, user_id: Uuid) -> Result<VideoRecord, UploadError> {
        let video = self
            .repo
            .get_video(video_id)
            .await
            .map_err(UploadError::Persistence)?
            .ok_or(UploadError::NotFound(video_id))?;

        if !video.is_owned_by(user_id) {
            return Err(UploadError::NotOwner { video_id, user_id });
        }
        Ok(video)
    }

    /// Publishes `url` into `field`, leaving every other field as stored, and
    /// returns the record as re-read after the write.
    pub async fn attach_url(
        &self,
        video_id: Uuid,
        user_id: Uuid,
        field: UrlField,
        url: String,
    ) -> Result<VideoRecord, UploadError> {
        let current = self.authorize(video_id, user_id).await?;
        let next = current.with_url(field, url, Utc::now());

        self.repo
            .update_video(&next)
            .await
            .map_err(UploadError::Persistence)?;

        self.repo
            .get_video(video_id)
            .await
            .map_err(UploadError::Persistence)?
            .ok_or_else(|| {
                UploadError::Persistence(format!("video {} vanished after update", video_id).into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::InMemoryVideoRepository;
    use crate::domain::video::CreateVideoParams;

    async fn seeded() -> (Arc<InMemoryVideoRepository>, VideoRecord) {
        let repo = Arc::new(InMemoryVideoRepository::new());
        let video = repo
            .create_video(CreateVideoParams {
                title: "Boots".into(),
                description: "walk".into(),
                user_id: Uuid::new_v4(),
            })
            .await
            .unwrap();
        (repo, video)
    }

    #[tokio::test]
    async fn test_attach_thumbnail_keeps_video_url() {
        let (repo, video) = seeded().await;
        let mut with_video = video.clone();
        with_video.video_url = Some("https://b.s3.r.amazonaws.com/landscape/x.mp4".into());
        repo.update_video(&with_video).await.unwrap();
        let updater = MetadataUpdater::new(repo.clone());

        let updated = updater
            .attach_url(video.id, video.user_id, UrlField::Thumbnail, "http://h/assets/t.png".into())
            .await
            .unwrap();

        assert_eq!(updated.thumbnail_url.as_deref(), Some("http://h/assets/t.png"));
        assert_eq!(updated.video_url, with_video.video_url);
        assert_eq!(updated.user_id, video.user_id);
        assert_eq!(updated.created_at, video.created_at);
    }

    #[tokio::test]
    async fn test_attach_video_keeps_thumbnail_url() {
        let (repo, video) = seeded().await;
        let updater = MetadataUpdater::new(repo.clone());
        updater
            .attach_url(video.id, video.user_id, UrlField::Thumbnail, "t".into())
            .await
            .unwrap();

        let updated = updater
            .attach_url(video.id, video.user_id, UrlField::Video, "v".into())
            .await
            .unwrap();

        assert_eq!(updated.thumbnail_url.as_deref(), Some("t"));
        assert_eq!(updated.video_url.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_non_owner_leaves_record_untouched() {
        let (repo, video) = seeded().await;
        let before = serde_json::to_vec(&repo.get_video(video.id).await.unwrap()).unwrap();
        let updater = MetadataUpdater::new(repo.clone());

        let result = updater
            .attach_url(video.id, Uuid::new_v4(), UrlField::Video, "v".into())
            .await;

        assert!(matches!(result, Err(UploadError::NotOwner { .. })));
        let after = serde_json::to_vec(&repo.get_video(video.id).await.unwrap()).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_unknown_video_is_not_found() {
        let (repo, video) = seeded().await;
        let updater = MetadataUpdater::new(repo);

        let missing = Uuid::new_v4();
        let result = updater.authorize(missing, video.user_id).await;

        assert!(matches!(result, Err(UploadError::NotFound(id)) if id == missing));
    }
}
