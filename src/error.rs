//! Upload error taxonomy and its HTTP mapping.

use crate::domain::asset::{AssetKind, RejectedMediaType};
use crate::ports::PortError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

const SERVER_ERROR_MESSAGE: &str = "Something went wrong";

/// Coarse grouping deciding status family and how much detail reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    Auth,
    Server,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid video id `{0}`")]
    InvalidId(String),
    #[error("unable to parse form: {0}")]
    BadForm(String),
    #[error("upload too large: {0}")]
    PayloadTooLarge(String),
    #[error("unsupported {kind} content type `{found}`")]
    UnsupportedMediaType { kind: AssetKind, found: String },
    #[error("video {0} not found")]
    NotFound(Uuid),

    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid bearer token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    #[error("user {user_id} does not own video {video_id}")]
    NotOwner { video_id: Uuid, user_id: Uuid },

    #[error("secure random source unavailable: {0}")]
    RandomSource(#[from] rand_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("fast-start remux failed: {0}")]
    Remux(#[source] PortError),
    #[error("video probe failed: {0}")]
    Probe(#[source] PortError),
    #[error("storage write failed: {0}")]
    Storage(#[source] PortError),
    #[error("metadata persistence failed: {0}")]
    Persistence(#[source] PortError),
}

impl UploadError {
    pub fn class(&self) -> ErrorClass {
        match self {
            UploadError::InvalidId(_)
            | UploadError::BadForm(_)
            | UploadError::PayloadTooLarge(_)
            | UploadError::UnsupportedMediaType { .. }
            | UploadError::NotFound(_) => ErrorClass::Client,
            UploadError::MissingToken
            | UploadError::InvalidToken(_)
            | UploadError::NotOwner { .. } => ErrorClass::Auth,
            UploadError::RandomSource(_)
            | UploadError::Io(_)
            | UploadError::Remux(_)
            | UploadError::Probe(_)
            | UploadError::Storage(_)
            | UploadError::Persistence(_) => ErrorClass::Server,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::NotFound(_) => StatusCode::NOT_FOUND,
            UploadError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => match self.class() {
                ErrorClass::Client => StatusCode::BAD_REQUEST,
                ErrorClass::Auth => StatusCode::UNAUTHORIZED,
                ErrorClass::Server => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Text safe to hand back to the caller. Server-side detail stays in the logs.
    pub fn client_message(&self) -> String {
        match self.class() {
            ErrorClass::Server => SERVER_ERROR_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<RejectedMediaType> for UploadError {
    fn from(err: RejectedMediaType) -> Self {
        UploadError::UnsupportedMediaType {
            kind: err.kind,
            found: err.found,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) fn error_response(error: &UploadError) -> Response {
    let body = Json(ErrorResponse {
        error: error.client_message(),
    });
    (error.status(), body).into_response()
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self.class() {
            ErrorClass::Server => tracing::error!(error = %self, "request failed"),
            _ => tracing::debug!(error = %self, "request rejected"),
        }
        error_response(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let id = Uuid::new_v4();
        assert_eq!(UploadError::InvalidId("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(UploadError::BadForm("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            UploadError::PayloadTooLarge("x".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(UploadError::NotFound(id).status(), StatusCode::NOT_FOUND);
        assert_eq!(UploadError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            UploadError::NotOwner { video_id: id, user_id: id }.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            UploadError::Storage("disk full".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = UploadError::Persistence("connection refused to 10.0.0.3".into());
        assert_eq!(err.client_message(), SERVER_ERROR_MESSAGE);

        let err = UploadError::UnsupportedMediaType {
            kind: AssetKind::Video,
            found: "video/webm".into(),
        };
        assert_eq!(err.client_message(), "unsupported video content type `video/webm`");
    }
}
