//! Local adapters for single-server deployment.

pub mod ffmpeg;
pub mod fs;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use ffmpeg::FfmpegToolkit;
pub use fs::LocalDiskStore;
pub use memory::{CachedThumbnailStore, InMemoryVideoRepository, MemoryThumbnailCache};
#[cfg(feature = "redis")]
pub use redis::RedisPool;
