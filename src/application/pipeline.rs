//! Per-request upload state machine.
//!
//! `AuthPending → Authenticated → Validated → Stored → (Processed) →
//! MetadataUpdated → Done`. `Processed` only exists for videos. A failure at
//! any stage ends the request as an `UploadFailure` tagged with that stage.

use crate::domain::asset::AssetKind;
use crate::error::{error_response, ErrorClass, UploadError};
use axum::response::{IntoResponse, Response};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    AuthPending,
    Authenticated,
    Validated,
    Stored,
    Processed,
    MetadataUpdated,
    Done,
}

impl UploadStage {
    /// The only stage reachable from `self` for an asset of `kind`.
    pub fn successor(self, kind: AssetKind) -> Option<UploadStage> {
        use UploadStage::*;
        match (self, kind) {
            (AuthPending, _) => Some(Authenticated),
            (Authenticated, _) => Some(Validated),
            (Validated, _) => Some(Stored),
            (Stored, AssetKind::Video) => Some(Processed),
            (Stored, AssetKind::Thumbnail) => Some(MetadataUpdated),
            (Processed, _) => Some(MetadataUpdated),
            (MetadataUpdated, _) => Some(Done),
            (Done, _) => None,
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStage::AuthPending => "auth_pending",
            UploadStage::Authenticated => "authenticated",
            UploadStage::Validated => "validated",
            UploadStage::Stored => "stored",
            UploadStage::Processed => "processed",
            UploadStage::MetadataUpdated => "metadata_updated",
            UploadStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct Pipeline {
    kind: AssetKind,
    stage: UploadStage,
}

impl Pipeline {
    pub fn start(kind: AssetKind) -> Self {
        Self {
            kind,
            stage: UploadStage::AuthPending,
        }
    }

    pub fn stage(&self) -> UploadStage {
        self.stage
    }

    /// Moves to the next stage. Stays on `Done` once reached.
    pub fn advance(&mut self) -> UploadStage {
        if let Some(next) = self.stage.successor(self.kind) {
            tracing::debug!(kind = %self.kind, from = %self.stage, to = %next, "upload stage");
            self.stage = next;
        }
        self.stage
    }

    /// Terminal `Failed(stage, reason)`.
    pub fn fail(&self, error: impl Into<UploadError>) -> UploadFailure {
        UploadFailure {
            kind: self.kind,
            stage: self.stage,
            error: error.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{kind} upload failed while {stage}: {error}")]
pub struct UploadFailure {
    pub kind: AssetKind,
    pub stage: UploadStage,
    #[source]
    pub error: UploadError,
}

impl IntoResponse for UploadFailure {
    fn into_response(self) -> Response {
        match self.error.class() {
            ErrorClass::Server => tracing::error!(
                kind = %self.kind,
                stage = %self.stage,
                error = %self.error,
                "upload failed"
            ),
            ErrorClass::Client | ErrorClass::Auth => tracing::warn!(
                kind = %self.kind,
                stage = %self.stage,
                error = %self.error,
                "upload rejected"
            ),
        }
        error_response(&self.error)
    }
}
