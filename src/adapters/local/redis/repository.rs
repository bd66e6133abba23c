//! Redis VideoRepository implementation.

use super::error::RedisStoreError;
use super::pool::RedisPool;
use super::VIDEO_RECORD_PREFIX;
use crate::domain::video::{CreateVideoParams, VideoRecord};
use crate::ports::repository::VideoRepository;
use crate::ports::PortError;
use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands};
use uuid::Uuid;

fn record_key(video_id: Uuid) -> String {
    format!("{}{}", VIDEO_RECORD_PREFIX, video_id)
}

#[async_trait]
impl VideoRepository for RedisPool {
    async fn create_video(&self, params: CreateVideoParams) -> Result<VideoRecord, PortError> {
        let mut conn = self.pool.get().await.map_err(RedisStoreError::from)?;
        let video = VideoRecord::new(params);
        let json = serde_json::to_string(&video).map_err(RedisStoreError::from)?;
        conn.set::<_, _, ()>(record_key(video.id), json)
            .await
            .map_err(RedisStoreError::from)?;
        Ok(video)
    }

    async fn get_video(&self, video_id: Uuid) -> Result<Option<VideoRecord>, PortError> {
        let mut conn = self.pool.get().await.map_err(RedisStoreError::from)?;
        let json: Option<String> = conn
            .get(record_key(video_id))
            .await
            .map_err(RedisStoreError::from)?;
        match json {
            Some(data) => Ok(Some(
                serde_json::from_str(&data).map_err(RedisStoreError::from)?,
            )),
            None => Ok(None),
        }
    }

    async fn update_video(&self, video: &VideoRecord) -> Result<(), PortError> {
        let mut conn = self.pool.get().await.map_err(RedisStoreError::from)?;
        let json = serde_json::to_string(video).map_err(RedisStoreError::from)?;
        // XX: only overwrite, never create.
        let reply: Option<String> = redis::cmd("SET")
            .arg(record_key(video.id))
            .arg(json)
            .arg("XX")
            .query_async(&mut conn)
            .await
            .map_err(RedisStoreError::from)?;
        match reply {
            Some(_) => Ok(()),
            None => Err(format!("video {} does not exist", video.id).into()),
        }
    }
}
