//! HTTP inbound adapter.
//!
//! Upload endpoints take multipart bodies; every response body is JSON except
//! buffered thumbnails and the static `/assets` mount.

pub mod handlers;

use crate::application::UploadService;
use crate::auth::JwtAuthenticator;
use crate::ports::repository::VideoRepository;
use crate::ports::thumbnails::ThumbnailCache;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub const DEFAULT_MAX_THUMBNAIL_BYTES: usize = 10 << 20;
pub const DEFAULT_MAX_VIDEO_BYTES: usize = 1 << 30;

#[derive(Clone)]
pub struct AppState {
    pub uploads: Arc<UploadService>,
    pub videos: Arc<dyn VideoRepository>,
    pub thumbnails: Arc<dyn ThumbnailCache>,
    pub auth: Arc<JwtAuthenticator>,
}

/// Request body ceilings for the two upload routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadLimits {
    pub thumbnail_bytes: usize,
    pub video_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            thumbnail_bytes: DEFAULT_MAX_THUMBNAIL_BYTES,
            video_bytes: DEFAULT_MAX_VIDEO_BYTES,
        }
    }
}

pub fn router(state: AppState, limits: UploadLimits, assets_root: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/videos", post(handlers::create_video))
        .route("/api/videos/:video_id", get(handlers::get_video))
        .route(
            "/api/thumbnail_upload/:video_id",
            post(handlers::upload_thumbnail).layer(DefaultBodyLimit::max(limits.thumbnail_bytes)),
        )
        .route(
            "/api/video_upload/:video_id",
            post(handlers::upload_video).layer(DefaultBodyLimit::max(limits.video_bytes)),
        )
        .route("/api/thumbnails/:video_id", get(handlers::get_thumbnail))
        .nest_service("/assets", ServeDir::new(assets_root))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
