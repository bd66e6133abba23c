//! Domain layer - Pure business logic.

pub mod asset;
pub mod av;
pub mod storage_key;
pub mod video;
