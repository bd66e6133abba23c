use super::PortError;
use crate::domain::av::Geometry;
use async_trait::async_trait;
use std::path::Path;

/// Container tooling the video pipeline relies on. Both operations need random
/// access to a complete local file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Rewrite `input` into `output` with the index atom ahead of the media data,
    /// copying streams without re-encoding.
    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), PortError>;

    /// Dimensions of the primary video stream.
    async fn probe_geometry(&self, input: &Path) -> Result<Geometry, PortError>;
}
