//! Ports - Trait definitions implemented by adapters.

use std::error::Error;

pub mod media;
pub mod repository;
pub mod storage;
pub mod thumbnails;

/// Error type crossing every port boundary.
pub type PortError = Box<dyn Error + Send + Sync>;
