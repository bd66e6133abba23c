use super::PortError;
use crate::domain::video::{CreateVideoParams, VideoRecord};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Insert a new draft record
    async fn create_video(&self, params: CreateVideoParams) -> Result<VideoRecord, PortError>;

    /// Get a record by id
    async fn get_video(&self, video_id: Uuid) -> Result<Option<VideoRecord>, PortError>;

    /// Replace an existing record wholesale
    /// Fails if no record with that id exists
    async fn update_video(&self, video: &VideoRecord) -> Result<(), PortError>;
}
