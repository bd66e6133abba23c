use super::PortError;
use crate::domain::storage_key::StorageKey;
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// "Put bytes at key, get URL" capability, one implementation per storage policy.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stream-copy an upload body into storage and return its public URL.
    async fn put_reader(
        &self,
        video_id: Uuid,
        key: &StorageKey,
        media_type: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<String, PortError>;

    /// Publish a local file and return its public URL.
    async fn put_file(
        &self,
        video_id: Uuid,
        key: &StorageKey,
        media_type: &str,
        local_path: &Path,
    ) -> Result<String, PortError>;
}
