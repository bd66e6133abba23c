//! Tubely - Media Upload Service
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (records, asset validation, storage keys, geometry)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations (HTTP, disk, memory, Redis, S3, ffmpeg)
//! - application/: Upload pipeline and metadata services
//! - config: Environment configuration
//!
//! # Features
//! - `redis`: Redis record store (default)
//! - `aws`: S3 asset backend
//! - `libav`: In-process geometry probe through libav instead of `ffprobe`
//! - `full`: All features

pub mod adapters;
pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use adapters::http::{router, AppState, UploadLimits};
pub use config::AppConfig;
pub use error::UploadError;
