use crate::domain::storage_key::StorageKey;
use crate::ports::storage::AssetStore;
use crate::ports::PortError;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use uuid::Uuid;

/// S3Store implements AssetStore for an AWS S3 bucket.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    region: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: String, region: String) -> Self {
        Self {
            client,
            bucket,
            region,
        }
    }

    pub fn url_for(&self, key: &StorageKey) -> String {
        object_url(&self.bucket, &self.region, &key.object_path())
    }

    async fn put(
        &self,
        key: &StorageKey,
        media_type: &str,
        body: ByteStream,
    ) -> Result<String, PortError> {
        let object_key = key.object_path();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type(media_type)
            .body(body)
            .send()
            .await?;
        tracing::info!(bucket = %self.bucket, key = %object_key, "object uploaded");
        Ok(self.url_for(key))
    }
}

pub fn object_url(bucket: &str, region: &str, object_key: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, object_key)
}

#[async_trait]
impl AssetStore for S3Store {
    async fn put_reader(
        &self,
        _video_id: Uuid,
        key: &StorageKey,
        media_type: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<String, PortError> {
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await?;
        self.put(key, media_type, ByteStream::from(body)).await
    }

    async fn put_file(
        &self,
        _video_id: Uuid,
        key: &StorageKey,
        media_type: &str,
        local_path: &Path,
    ) -> Result<String, PortError> {
        let body = ByteStream::from_path(local_path).await?;
        self.put(key, media_type, body).await
    }
}
