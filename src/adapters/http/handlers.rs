use super::AppState;
use crate::application::{FormFile, UploadFailure};
use crate::domain::asset::AssetKind;
use crate::domain::video::{CreateVideoParams, VideoRecord};
use crate::error::UploadError;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use serde::Deserialize;
use std::io;
use tokio_util::io::StreamReader;
use uuid::Uuid;

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

fn parse_video_id(raw: &str) -> Result<Uuid, UploadError> {
    Uuid::parse_str(raw).map_err(|_| UploadError::InvalidId(raw.to_string()))
}

fn multipart_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::PayloadTooLarge(err.body_text())
    } else {
        UploadError::BadForm(err.body_text())
    }
}

/// The request body is not multipart at all.
fn multipart_rejection(rejection: MultipartRejection) -> UploadError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::PayloadTooLarge(rejection.body_text())
    } else {
        UploadError::BadForm(rejection.body_text())
    }
}

fn missing_field(kind: AssetKind) -> UploadError {
    UploadError::BadForm(format!("missing form file `{}`", kind.form_field()))
}

/// True when the body limit tripped while the file was being streamed, which
/// surfaces as an io error wrapping the multipart error.
fn exceeded_body_limit(error: &UploadError) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = source {
        let multipart = err.downcast_ref::<MultipartError>().or_else(|| {
            err.downcast_ref::<io::Error>()
                .and_then(|io_err| io_err.get_ref())
                .and_then(|inner| inner.downcast_ref::<MultipartError>())
        });
        if let Some(multipart) = multipart {
            return multipart.status() == StatusCode::PAYLOAD_TOO_LARGE;
        }
        source = err.source();
    }
    false
}

fn classify_failure(failure: UploadFailure) -> UploadFailure {
    if exceeded_body_limit(&failure.error) {
        UploadFailure {
            error: UploadError::PayloadTooLarge(format!("{} exceeds the upload limit", failure.kind)),
            ..failure
        }
    } else {
        failure
    }
}

fn form_file(field: axum::extract::multipart::Field<'_>) -> FormFile<'_> {
    let content_type = field.content_type().map(str::to_owned);
    let stream = field.map_err(|err| io::Error::new(io::ErrorKind::Other, err));
    FormFile {
        content_type,
        body: Box::pin(StreamReader::new(stream)),
    }
}

pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoRecord>, UploadFailure> {
    let kind = AssetKind::Thumbnail;
    let ticket = state
        .uploads
        .admit(kind, &video_id, authorization(&headers))
        .await?;
    let mut multipart =
        multipart.map_err(|rejection| ticket.fail(multipart_rejection(rejection)))?;

    let field = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(kind.form_field()) => break field,
            Ok(Some(_)) => continue,
            Ok(None) => return Err(ticket.fail(missing_field(kind))),
            Err(err) => return Err(ticket.fail(multipart_error(err))),
        }
    };

    let video = state
        .uploads
        .upload_thumbnail(ticket, form_file(field))
        .await
        .map_err(classify_failure)?;
    Ok(Json(video))
}

pub async fn upload_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoRecord>, UploadFailure> {
    let kind = AssetKind::Video;
    let ticket = state
        .uploads
        .admit(kind, &video_id, authorization(&headers))
        .await?;
    let mut multipart =
        multipart.map_err(|rejection| ticket.fail(multipart_rejection(rejection)))?;

    let field = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(kind.form_field()) => break field,
            Ok(Some(_)) => continue,
            Ok(None) => return Err(ticket.fail(missing_field(kind))),
            Err(err) => return Err(ticket.fail(multipart_error(err))),
        }
    };

    let video = state
        .uploads
        .upload_video(ticket, form_file(field))
        .await
        .map_err(classify_failure)?;
    Ok(Json(video))
}

/// Serves a thumbnail held by the in-memory buffer.
pub async fn get_thumbnail(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Response, UploadError> {
    let video_id = parse_video_id(&video_id)?;
    let thumbnail = state
        .thumbnails
        .get(video_id)
        .await
        .ok_or(UploadError::NotFound(video_id))?;

    Ok(([(header::CONTENT_TYPE, thumbnail.media_type)], thumbnail.data).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

pub async fn create_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateVideoRequest>,
) -> Result<(StatusCode, Json<VideoRecord>), UploadError> {
    let user_id = state.auth.authenticate(authorization(&headers))?;
    let video = state
        .videos
        .create_video(CreateVideoParams {
            title: request.title,
            description: request.description,
            user_id,
        })
        .await
        .map_err(UploadError::Persistence)?;

    tracing::info!(video_id = %video.id, %user_id, "video draft created");
    Ok((StatusCode::CREATED, Json(video)))
}

pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<VideoRecord>, UploadError> {
    let video_id = parse_video_id(&video_id)?;
    let video = state
        .videos
        .get_video(video_id)
        .await
        .map_err(UploadError::Persistence)?
        .ok_or(UploadError::NotFound(video_id))?;
    Ok(Json(video))
}
