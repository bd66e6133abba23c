use bytes::Bytes;
use async_trait::async_trait;
use uuid::Uuid;

/// A thumbnail held in memory until it is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedThumbnail {
    pub media_type: String,
    pub data: Bytes,
}

/// Keyed buffer of thumbnails, one entry per video.
#[async_trait]
pub trait ThumbnailCache: Send + Sync {
    /// Store or replace the entry for a video
    async fn put(&self, video_id: Uuid, thumbnail: CachedThumbnail);

    async fn get(&self, video_id: Uuid) -> Option<CachedThumbnail>;
}
