//! Tubely server binary.
//!
//! Wires the configured record store, asset backends and ffmpeg toolkit into
//! the HTTP router and serves it until interrupted.

use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tubely::adapters::local::{
    CachedThumbnailStore, FfmpegToolkit, InMemoryVideoRepository, LocalDiskStore,
    MemoryThumbnailCache,
};
use tubely::application::{MetadataUpdater, UploadService};
use tubely::auth::JwtAuthenticator;
use tubely::config::{AppConfig, ThumbnailBackend, VideoBackend};
use tubely::ports::repository::VideoRepository;
use tubely::ports::storage::AssetStore;
use tubely::ports::thumbnails::ThumbnailCache;
use tubely::{router, AppState};

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tubely=info,tower_http=info")),
        )
        .init();

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), BoxError> {
    tokio::fs::create_dir_all(&config.assets_root).await?;
    tokio::fs::create_dir_all(&config.scratch_dir).await?;

    // 1. Adapters
    let videos = video_repository(&config)?;
    let thumbnails: Arc<dyn ThumbnailCache> = Arc::new(MemoryThumbnailCache::new());
    let disk: Arc<dyn AssetStore> = Arc::new(LocalDiskStore::new(
        &config.assets_root,
        &config.public_base_url,
    ));

    let thumbnail_store: Arc<dyn AssetStore> = match config.thumbnail_backend {
        ThumbnailBackend::Disk => disk.clone(),
        ThumbnailBackend::Memory => Arc::new(CachedThumbnailStore::new(
            thumbnails.clone(),
            &config.public_base_url,
        )),
        ThumbnailBackend::S3 => object_store(&config).await?,
    };
    let video_store: Arc<dyn AssetStore> = match config.video_backend {
        VideoBackend::Disk => disk,
        VideoBackend::S3 => object_store(&config).await?,
    };
    let toolkit = Arc::new(FfmpegToolkit::new(&config.ffmpeg_bin, &config.ffprobe_bin));

    // 2. Application services
    let auth = Arc::new(JwtAuthenticator::new(&config.jwt_secret));
    let uploads = Arc::new(UploadService::new(
        auth.clone(),
        MetadataUpdater::new(videos.clone()),
        thumbnail_store,
        video_store,
        toolkit,
        config.scratch_dir.clone(),
    ));

    // 3. HTTP layer
    let state = AppState {
        uploads,
        videos,
        thumbnails,
        auth,
    };
    let app = router(state, config.limits, &config.assets_root);

    // 4. Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        addr = %config.bind_addr(),
        thumbnails = ?config.thumbnail_backend,
        videos = ?config.video_backend,
        "listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[cfg(feature = "redis")]
fn video_repository(config: &AppConfig) -> Result<Arc<dyn VideoRepository>, BoxError> {
    match &config.redis_url {
        Some(url) => Ok(Arc::new(tubely::adapters::local::RedisPool::new(url)?)),
        None => Ok(Arc::new(InMemoryVideoRepository::new())),
    }
}

#[cfg(not(feature = "redis"))]
fn video_repository(config: &AppConfig) -> Result<Arc<dyn VideoRepository>, BoxError> {
    match &config.redis_url {
        Some(_) => Err("REDIS_URL is set but the `redis` feature is disabled".into()),
        None => Ok(Arc::new(InMemoryVideoRepository::new())),
    }
}

#[cfg(feature = "aws")]
async fn object_store(config: &AppConfig) -> Result<Arc<dyn AssetStore>, BoxError> {
    let s3 = config
        .s3
        .as_ref()
        .ok_or("the s3 backend needs S3_BUCKET and S3_REGION")?;
    let aws = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(s3.region.clone()))
        .load()
        .await;
    Ok(Arc::new(tubely::adapters::aws::S3Store::new(
        aws_sdk_s3::Client::new(&aws),
        s3.bucket.clone(),
        s3.region.clone(),
    )))
}

#[cfg(not(feature = "aws"))]
async fn object_store(_config: &AppConfig) -> Result<Arc<dyn AssetStore>, BoxError> {
    Err("the s3 backend requires the `aws` feature".into())
}
