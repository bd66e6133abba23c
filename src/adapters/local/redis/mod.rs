//! Redis adapter for local deployment.
//!
//! Provides a Redis-backed `VideoRepository`; each record is one JSON string.

mod error;
mod pool;
mod repository;

pub use error::RedisStoreError;
pub use pool::RedisPool;

/// Redis key constants
const VIDEO_RECORD_PREFIX: &str = "tubely:video:";
