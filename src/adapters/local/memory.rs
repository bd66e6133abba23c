//! Process-local, non-durable implementations of the thumbnail buffer and the
//! record store. Everything here is lost on restart.

use crate::domain::storage_key::StorageKey;
use crate::domain::video::{CreateVideoParams, VideoRecord};
use crate::ports::repository::VideoRepository;
use crate::ports::storage::AssetStore;
use crate::ports::thumbnails::{CachedThumbnail, ThumbnailCache};
use crate::ports::PortError;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryThumbnailCache {
    entries: RwLock<HashMap<Uuid, CachedThumbnail>>,
}

impl MemoryThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThumbnailCache for MemoryThumbnailCache {
    async fn put(&self, video_id: Uuid, thumbnail: CachedThumbnail) {
        self.entries.write().await.insert(video_id, thumbnail);
    }

    async fn get(&self, video_id: Uuid) -> Option<CachedThumbnail> {
        self.entries.read().await.get(&video_id).cloned()
    }
}

/// Buffers a whole upload and hands it to a `ThumbnailCache`, keyed by video id.
/// Only suitable for bounded payloads.
#[derive(Clone)]
pub struct CachedThumbnailStore {
    cache: Arc<dyn ThumbnailCache>,
    base_url: String,
}

impl CachedThumbnailStore {
    pub fn new(cache: Arc<dyn ThumbnailCache>, base_url: &str) -> Self {
        Self {
            cache,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn publish(&self, video_id: Uuid, media_type: &str, data: Vec<u8>) -> String {
        let thumbnail = CachedThumbnail {
            media_type: media_type.to_string(),
            data: Bytes::from(data),
        };
        self.cache.put(video_id, thumbnail).await;
        format!("{}/api/thumbnails/{}", self.base_url, video_id)
    }
}

#[async_trait]
impl AssetStore for CachedThumbnailStore {
    async fn put_reader(
        &self,
        video_id: Uuid,
        _key: &StorageKey,
        media_type: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<String, PortError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        Ok(self.publish(video_id, media_type, data).await)
    }

    async fn put_file(
        &self,
        video_id: Uuid,
        _key: &StorageKey,
        media_type: &str,
        local_path: &Path,
    ) -> Result<String, PortError> {
        let data = tokio::fs::read(local_path).await?;
        Ok(self.publish(video_id, media_type, data).await)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryVideoRepository {
    videos: RwLock<HashMap<Uuid, VideoRecord>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create_video(&self, params: CreateVideoParams) -> Result<VideoRecord, PortError> {
        let video = VideoRecord::new(params);
        self.videos.write().await.insert(video.id, video.clone());
        Ok(video)
    }

    async fn get_video(&self, video_id: Uuid) -> Result<Option<VideoRecord>, PortError> {
        Ok(self.videos.read().await.get(&video_id).cloned())
    }

    async fn update_video(&self, video: &VideoRecord) -> Result<(), PortError> {
        let mut videos = self.videos.write().await;
        match videos.get_mut(&video.id) {
            Some(current) => {
                *current = video.clone();
                Ok(())
            }
            None => Err(format!("video {} does not exist", video.id).into()),
        }
    }
}
