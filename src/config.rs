//! Configuration loaded from the process environment.

use crate::adapters::http::{UploadLimits, DEFAULT_MAX_THUMBNAIL_BYTES, DEFAULT_MAX_VIDEO_BYTES};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} env var required")]
    Missing(&'static str),
    #[error("invalid value `{value}` for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where thumbnails are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThumbnailBackend {
    Disk,
    Memory,
    S3,
}

impl FromStr for ThumbnailBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disk" => Ok(ThumbnailBackend::Disk),
            "memory" => Ok(ThumbnailBackend::Memory),
            "s3" => Ok(ThumbnailBackend::S3),
            _ => Err("expected one of disk, memory, s3".to_string()),
        }
    }
}

/// Where processed videos are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoBackend {
    Disk,
    S3,
}

impl FromStr for VideoBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disk" => Ok(VideoBackend::Disk),
            "s3" => Ok(VideoBackend::S3),
            _ => Err("expected one of disk, s3".to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: u16,
    /// Prefix for URLs of locally served assets and buffered thumbnails
    pub public_base_url: String,
    /// Root directory served under `/assets`
    pub assets_root: PathBuf,
    /// Parent of the per-request scratch directories
    pub scratch_dir: PathBuf,
    /// HS256 secret for access tokens
    pub jwt_secret: String,
    pub thumbnail_backend: ThumbnailBackend,
    pub video_backend: VideoBackend,
    /// Set when either backend is `s3`
    pub s3: Option<S3Config>,
    /// Redis record store; records stay in process memory when unset
    pub redis_url: Option<String>,
    pub ffmpeg_bin: PathBuf,
    pub ffprobe_bin: PathBuf,
    pub limits: UploadLimits,
}

impl AppConfig {
    /// Load configuration from environment variables, reading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let addr = var("ADDR").unwrap_or_else(|| String::from("127.0.0.1"));
        let port: u16 = parse_or(&var, "PORT", 8091)?;
        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let thumbnail_backend = parse_or(&var, "THUMBNAIL_BACKEND", ThumbnailBackend::Disk)?;
        let video_backend = parse_or(&var, "VIDEO_BACKEND", VideoBackend::Disk)?;
        let s3 = if thumbnail_backend == ThumbnailBackend::S3 || video_backend == VideoBackend::S3 {
            Some(S3Config {
                bucket: var("S3_BUCKET").ok_or(ConfigError::Missing("S3_BUCKET"))?,
                region: var("S3_REGION").ok_or(ConfigError::Missing("S3_REGION"))?,
            })
        } else {
            None
        };

        Ok(Self {
            addr,
            port,
            public_base_url,
            assets_root: var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./assets")),
            scratch_dir: var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            jwt_secret,
            thumbnail_backend,
            video_backend,
            s3,
            redis_url: var("REDIS_URL"),
            ffmpeg_bin: var("FFMPEG_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ffmpeg")),
            ffprobe_bin: var("FFPROBE_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ffprobe")),
            limits: UploadLimits {
                thumbnail_bytes: parse_or(&var, "MAX_THUMBNAIL_BYTES", DEFAULT_MAX_THUMBNAIL_BYTES)?,
                video_bytes: parse_or(&var, "MAX_VIDEO_BYTES", DEFAULT_MAX_VIDEO_BYTES)?,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

fn parse_or<T, V>(var: &V, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
            key,
            value,
            reason: err.to_string(),
        }),
    }
}
