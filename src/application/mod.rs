//! Application layer - Upload services composed from ports.

pub mod metadata;
pub mod pipeline;
pub mod upload;

pub use metadata::MetadataUpdater;
pub use pipeline::{Pipeline, UploadFailure, UploadStage};
pub use upload::{FormFile, UploadService, UploadTicket};
