use super::metadata::MetadataUpdater;
use super::pipeline::{Pipeline, UploadFailure};
use crate::auth::JwtAuthenticator;
use crate::domain::asset::{validate_media_type, AssetKind};
use crate::domain::storage_key::StorageKey;
use crate::domain::video::{UrlField, VideoRecord};
use crate::error::UploadError;
use crate::ports::media::MediaToolkit;
use crate::ports::storage::AssetStore;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWriteExt, BufWriter};
use uuid::Uuid;

/// The file part of a multipart upload: declared type plus a body that is read
/// at most once.
pub struct FormFile<'a> {
    pub content_type: Option<String>,
    pub body: Pin<Box<dyn AsyncRead + Send + 'a>>,
}

/// An admitted request: id parsed, caller authenticated and confirmed as owner.
#[derive(Debug)]
pub struct UploadTicket {
    pipeline: Pipeline,
    video_id: Uuid,
    user_id: Uuid,
}

impl UploadTicket {
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn fail(&self, error: impl Into<UploadError>) -> UploadFailure {
        self.pipeline.fail(error)
    }
}

pub struct UploadService {
    auth: Arc<JwtAuthenticator>,
    metadata: MetadataUpdater,
    thumbnail_store: Arc<dyn AssetStore>,
    video_store: Arc<dyn AssetStore>,
    toolkit: Arc<dyn MediaToolkit>,
    scratch_dir: PathBuf,
}

impl UploadService {
    pub fn new(
        auth: Arc<JwtAuthenticator>,
        metadata: MetadataUpdater,
        thumbnail_store: Arc<dyn AssetStore>,
        video_store: Arc<dyn AssetStore>,
        toolkit: Arc<dyn MediaToolkit>,
        scratch_dir: PathBuf,
    ) -> Self {
        Self {
            auth,
            metadata,
            thumbnail_store,
            video_store,
            toolkit,
            scratch_dir,
        }
    }

    /// `AuthPending → Authenticated`: parses the id, verifies the bearer token
    /// and checks ownership before any byte of the body is read.
    pub async fn admit(
        &self,
        kind: AssetKind,
        raw_video_id: &str,
        authorization: Option<&str>,
    ) -> Result<UploadTicket, UploadFailure> {
        let mut pipeline = Pipeline::start(kind);

        let video_id = Uuid::parse_str(raw_video_id)
            .map_err(|_| pipeline.fail(UploadError::InvalidId(raw_video_id.to_string())))?;
        let user_id = self
            .auth
            .authenticate(authorization)
            .map_err(|e| pipeline.fail(e))?;

        tracing::info!(%video_id, %user_id, %kind, "upload started");

        self.metadata
            .authorize(video_id, user_id)
            .await
            .map_err(|e| pipeline.fail(e))?;
        pipeline.advance();

        Ok(UploadTicket {
            pipeline,
            video_id,
            user_id,
        })
    }

    pub async fn upload_thumbnail(
        &self,
        mut ticket: UploadTicket,
        mut file: FormFile<'_>,
    ) -> Result<VideoRecord, UploadFailure> {
        let media = validate_media_type(AssetKind::Thumbnail, file.content_type.as_deref())
            .map_err(|e| ticket.fail(e))?;
        ticket.pipeline.advance();

        let key = StorageKey::generate(media.extension()).map_err(|e| ticket.fail(e))?;
        let url = self
            .thumbnail_store
            .put_reader(ticket.video_id, &key, media.essence(), &mut file.body)
            .await
            .map_err(|e| ticket.fail(UploadError::Storage(e)))?;
        ticket.pipeline.advance();

        self.publish(ticket, UrlField::Thumbnail, url).await
    }

    pub async fn upload_video(
        &self,
        mut ticket: UploadTicket,
        mut file: FormFile<'_>,
    ) -> Result<VideoRecord, UploadFailure> {
        let media = validate_media_type(AssetKind::Video, file.content_type.as_deref())
            .map_err(|e| ticket.fail(e))?;
        ticket.pipeline.advance();

        // Dropping the directory removes the staged and remuxed copies on every
        // path out of this function, including cancellation.
        let scratch = tempfile::Builder::new()
            .prefix("tubely-")
            .tempdir_in(&self.scratch_dir)
            .map_err(|e| ticket.fail(e))?;
        let staged = scratch.path().join(format!("upload.{}", media.extension()));
        let processed = scratch
            .path()
            .join(format!("upload.faststart.{}", media.extension()));

        stage_to_file(&mut file.body, &staged)
            .await
            .map_err(|e| ticket.fail(e))?;
        ticket.pipeline.advance();

        self.toolkit
            .remux_fast_start(&staged, &processed)
            .await
            .map_err(|e| ticket.fail(UploadError::Remux(e)))?;
        let geometry = self
            .toolkit
            .probe_geometry(&processed)
            .await
            .map_err(|e| ticket.fail(UploadError::Probe(e)))?;
        let aspect = geometry.aspect_class();
        tracing::info!(
            video_id = %ticket.video_id,
            width = geometry.width,
            height = geometry.height,
            aspect = %aspect,
            "video processed"
        );

        let key = StorageKey::generate(media.extension())
            .map_err(|e| ticket.fail(e))?
            .with_prefix(aspect);
        let url = self
            .video_store
            .put_file(ticket.video_id, &key, media.essence(), &processed)
            .await
            .map_err(|e| ticket.fail(UploadError::Storage(e)))?;
        ticket.pipeline.advance();

        if let Err(err) = scratch.close() {
            tracing::warn!(error = %err, "failed to remove scratch directory");
        }

        self.publish(ticket, UrlField::Video, url).await
    }

    /// `→ MetadataUpdated → Done`. A failure here leaves the stored asset
    /// unreferenced; it is logged for reconciliation, not deleted.
    async fn publish(
        &self,
        mut ticket: UploadTicket,
        field: UrlField,
        url: String,
    ) -> Result<VideoRecord, UploadFailure> {
        let record = match self
            .metadata
            .attach_url(ticket.video_id, ticket.user_id, field, url.clone())
            .await
        {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(video_id = %ticket.video_id, orphaned_asset = %url, "stored asset is no longer referenced");
                return Err(ticket.fail(err));
            }
        };
        ticket.pipeline.advance();
        ticket.pipeline.advance();

        tracing::info!(video_id = %ticket.video_id, %url, "upload published");
        Ok(record)
    }
}

async fn stage_to_file(
    reader: &mut (dyn AsyncRead + Send + Unpin),
    path: &Path,
) -> std::io::Result<()> {
    let mut file = BufWriter::new(File::create(path).await?);
    tokio::io::copy(reader, &mut file).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::{InMemoryVideoRepository, LocalDiskStore};
    use crate::application::pipeline::UploadStage;
    use crate::domain::av::Geometry;
    use crate::domain::video::CreateVideoParams;
    use crate::ports::media::MockMediaToolkit;
    use crate::ports::repository::VideoRepository;
    use chrono::Duration;
    use tempfile::{tempdir, TempDir};

    struct Harness {
        service: UploadService,
        repo: Arc<InMemoryVideoRepository>,
        auth: Arc<JwtAuthenticator>,
        assets: TempDir,
        scratch: TempDir,
    }

    fn harness(toolkit: MockMediaToolkit) -> Harness {
        let assets = tempdir().unwrap();
        let scratch = tempdir().unwrap();
        let repo = Arc::new(InMemoryVideoRepository::new());
        let auth = Arc::new(JwtAuthenticator::new("test-secret"));
        let store = Arc::new(LocalDiskStore::new(assets.path(), "http://localhost:8091"));
        let service = UploadService::new(
            auth.clone(),
            MetadataUpdater::new(repo.clone()),
            store.clone(),
            store,
            Arc::new(toolkit),
            scratch.path().to_path_buf(),
        );
        Harness {
            service,
            repo,
            auth,
            assets,
            scratch,
        }
    }

    impl Harness {
        async fn video_for(&self, owner: Uuid) -> VideoRecord {
            self.repo
                .create_video(CreateVideoParams {
                    title: "clip".into(),
                    description: "".into(),
                    user_id: owner,
                })
                .await
                .unwrap()
        }

        fn header(&self, user_id: Uuid) -> String {
            format!("Bearer {}", self.auth.issue(user_id, Duration::minutes(5)).unwrap())
        }

        fn entries(dir: &TempDir) -> usize {
            walk_files(dir.path())
        }
    }

    fn walk_files(path: &Path) -> usize {
        std::fs::read_dir(path)
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                if entry.file_type().unwrap().is_dir() {
                    walk_files(&entry.path())
                } else {
                    1
                }
            })
            .sum()
    }

    fn file(content_type: &str, data: &'static [u8]) -> FormFile<'static> {
        FormFile {
            content_type: Some(content_type.to_string()),
            body: Box::pin(data),
        }
    }

    #[tokio::test]
    async fn test_admit_rejects_bad_id_before_auth() {
        let h = harness(MockMediaToolkit::new());

        let failure = h
            .service
            .admit(AssetKind::Thumbnail, "not-a-uuid", None)
            .await
            .unwrap_err();

        assert!(matches!(failure.error, UploadError::InvalidId(_)));
        assert_eq!(failure.stage, UploadStage::AuthPending);
    }

    #[tokio::test]
    async fn test_admit_rejects_non_owner() {
        let h = harness(MockMediaToolkit::new());
        let video = h.video_for(Uuid::new_v4()).await;
        let header = h.header(Uuid::new_v4());

        let failure = h
            .service
            .admit(AssetKind::Video, &video.id.to_string(), Some(&header))
            .await
            .unwrap_err();

        assert!(matches!(failure.error, UploadError::NotOwner { .. }));
    }

    #[tokio::test]
    async fn test_thumbnail_upload_publishes_url() {
        let h = harness(MockMediaToolkit::new());
        let owner = Uuid::new_v4();
        let video = h.video_for(owner).await;
        let header = h.header(owner);

        let ticket = h
            .service
            .admit(AssetKind::Thumbnail, &video.id.to_string(), Some(&header))
            .await
            .unwrap();
        assert_eq!(ticket.pipeline().stage(), UploadStage::Authenticated);
        let record = h
            .service
            .upload_thumbnail(ticket, file("image/png", b"png"))
            .await
            .unwrap();

        let url = record.thumbnail_url.unwrap();
        assert!(url.starts_with("http://localhost:8091/assets/"));
        assert!(url.ends_with(".png"));
        assert_eq!(record.video_url, None);
        assert_eq!(Harness::entries(&h.assets), 1);
    }

    #[tokio::test]
    async fn test_video_upload_namespaces_by_aspect_and_cleans_scratch() {
        let mut toolkit = MockMediaToolkit::new();
        toolkit
            .expect_remux_fast_start()
            .times(1)
            .returning(|input, output| {
                std::fs::copy(input, output)?;
                Ok(())
            });
        toolkit
            .expect_probe_geometry()
            .times(1)
            .returning(|_| Ok(Geometry { width: 1080, height: 1920 }));
        let h = harness(toolkit);
        let owner = Uuid::new_v4();
        let video = h.video_for(owner).await;
        let header = h.header(owner);

        let ticket = h
            .service
            .admit(AssetKind::Video, &video.id.to_string(), Some(&header))
            .await
            .unwrap();
        let record = h
            .service
            .upload_video(ticket, file("video/mp4", b"ftyp moov mdat"))
            .await
            .unwrap();

        let url = record.video_url.unwrap();
        assert!(url.contains("/assets/portrait/"));
        assert!(url.ends_with(".mp4"));
        assert_eq!(Harness::entries(&h.scratch), 0);
        assert_eq!(Harness::entries(&h.assets), 1);
    }

    #[tokio::test]
    async fn test_remux_failure_stores_nothing() {
        let mut toolkit = MockMediaToolkit::new();
        toolkit
            .expect_remux_fast_start()
            .times(1)
            .returning(|_, output| {
                std::fs::write(output, b"half a moov")?;
                Err("invalid data found when processing input".into())
            });
        toolkit.expect_probe_geometry().never();
        let h = harness(toolkit);
        let owner = Uuid::new_v4();
        let video = h.video_for(owner).await;
        let header = h.header(owner);

        let ticket = h
            .service
            .admit(AssetKind::Video, &video.id.to_string(), Some(&header))
            .await
            .unwrap();
        let failure = h
            .service
            .upload_video(ticket, file("video/mp4", b"garbage"))
            .await
            .unwrap_err();

        assert!(matches!(failure.error, UploadError::Remux(_)));
        assert_eq!(failure.stage, UploadStage::Stored);
        assert_eq!(Harness::entries(&h.scratch), 0);
        assert_eq!(Harness::entries(&h.assets), 0);
        assert_eq!(h.repo.get_video(video.id).await.unwrap().unwrap(), video);
    }

    #[tokio::test]
    async fn test_probe_failure_is_server_error() {
        let mut toolkit = MockMediaToolkit::new();
        toolkit.expect_remux_fast_start().returning(|_, _| Ok(()));
        toolkit
            .expect_probe_geometry()
            .returning(|_| Err("no video stream".into()));
        let h = harness(toolkit);
        let owner = Uuid::new_v4();
        let video = h.video_for(owner).await;
        let header = h.header(owner);

        let ticket = h
            .service
            .admit(AssetKind::Video, &video.id.to_string(), Some(&header))
            .await
            .unwrap();
        let failure = h
            .service
            .upload_video(ticket, file("video/mp4", b"ftyp"))
            .await
            .unwrap_err();

        assert!(matches!(failure.error, UploadError::Probe(_)));
        assert_eq!(failure.error.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(Harness::entries(&h.scratch), 0);
    }

    #[tokio::test]
    async fn test_wrong_video_type_never_reaches_toolkit() {
        let mut toolkit = MockMediaToolkit::new();
        toolkit.expect_remux_fast_start().never();
        let h = harness(toolkit);
        let owner = Uuid::new_v4();
        let video = h.video_for(owner).await;
        let header = h.header(owner);

        let ticket = h
            .service
            .admit(AssetKind::Video, &video.id.to_string(), Some(&header))
            .await
            .unwrap();
        let failure = h
            .service
            .upload_video(ticket, file("video/quicktime", b"qt"))
            .await
            .unwrap_err();

        assert!(matches!(failure.error, UploadError::UnsupportedMediaType { .. }));
        assert_eq!(failure.stage, UploadStage::Authenticated);
        assert_eq!(Harness::entries(&h.scratch), 0);
    }
}
