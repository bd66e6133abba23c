use crate::domain::storage_key::StorageKey;
use crate::ports::storage::AssetStore;
use crate::ports::PortError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWriteExt, BufWriter};
use uuid::Uuid;

/// Writes assets under a local root served at `<base_url>/assets/`.
#[derive(Clone, Debug)]
pub struct LocalDiskStore {
    assets_root: PathBuf,
    base_url: String,
}

impl LocalDiskStore {
    pub fn new(assets_root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            assets_root: assets_root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn path_for(&self, key: &StorageKey) -> PathBuf {
        self.assets_root.join(key.object_path())
    }

    pub fn url_for(&self, key: &StorageKey) -> String {
        format!("{}/assets/{}", self.base_url, key.object_path())
    }

    async fn prepare(&self, key: &StorageKey) -> Result<PathBuf, PortError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(path)
    }
}

async fn copy_into(
    reader: &mut (dyn AsyncRead + Send + Unpin),
    path: &Path,
) -> std::io::Result<u64> {
    let mut file = BufWriter::new(File::create(path).await?);
    let written = tokio::io::copy(reader, &mut file).await?;
    file.flush().await?;
    Ok(written)
}

/// Removes a half-written asset. A file that was never created is not an error.
async fn discard_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to remove partial asset");
        }
    }
}

#[async_trait]
impl AssetStore for LocalDiskStore {
    async fn put_reader(
        &self,
        _video_id: Uuid,
        key: &StorageKey,
        _media_type: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<String, PortError> {
        let path = self.prepare(key).await?;
        match copy_into(reader, &path).await {
            Ok(written) => {
                tracing::debug!(path = %path.display(), bytes = written, "asset written");
                Ok(self.url_for(key))
            }
            Err(err) => {
                discard_partial(&path).await;
                Err(err.into())
            }
        }
    }

    async fn put_file(
        &self,
        _video_id: Uuid,
        key: &StorageKey,
        _media_type: &str,
        local_path: &Path,
    ) -> Result<String, PortError> {
        let path = self.prepare(key).await?;
        if let Err(err) = tokio::fs::copy(local_path, &path).await {
            discard_partial(&path).await;
            return Err(err.into());
        }
        tracing::debug!(path = %path.display(), "asset copied");
        Ok(self.url_for(key))
    }
}
