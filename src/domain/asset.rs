use mime_guess::mime::Mime;
use std::fmt;

/// The two kinds of asset a video record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Thumbnail,
    Video,
}

impl AssetKind {
    /// Declared content types accepted for this kind, compared on the MIME essence.
    pub fn allowed_types(self) -> &'static [&'static str] {
        match self {
            AssetKind::Thumbnail => &["image/jpeg", "image/png"],
            AssetKind::Video => &["video/mp4"],
        }
    }

    /// Multipart form field carrying the upload.
    pub fn form_field(self) -> &'static str {
        match self {
            AssetKind::Thumbnail => "thumbnail",
            AssetKind::Video => "video",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Thumbnail => write!(f, "thumbnail"),
            AssetKind::Video => write!(f, "video"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported {kind} content type `{found}`")]
pub struct RejectedMediaType {
    pub kind: AssetKind,
    pub found: String,
}

/// A declared content type that passed the allow-list for its kind.
#[derive(Debug, Clone)]
pub struct ValidatedMedia {
    kind: AssetKind,
    mime: Mime,
}

impl ValidatedMedia {
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// `type/subtype` without parameters.
    pub fn essence(&self) -> &str {
        self.mime.essence_str()
    }

    /// Storage extension, taken from the MIME subtype (`jpeg`, `png`, `mp4`).
    pub fn extension(&self) -> &str {
        self.mime.subtype().as_str()
    }
}

pub fn validate_media_type(
    kind: AssetKind,
    declared: Option<&str>,
) -> Result<ValidatedMedia, RejectedMediaType> {
    let reject = || RejectedMediaType {
        kind,
        found: declared.unwrap_or("").to_string(),
    };

    let mime: Mime = declared
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(reject)?
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| reject())?;

    if !kind.allowed_types().contains(&mime.essence_str()) {
        return Err(reject());
    }

    Ok(ValidatedMedia { kind, mime })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_accepts_jpeg_and_png() {
        let jpeg = validate_media_type(AssetKind::Thumbnail, Some("image/jpeg")).unwrap();
        assert_eq!(jpeg.extension(), "jpeg");
        assert_eq!(jpeg.essence(), "image/jpeg");

        let png = validate_media_type(AssetKind::Thumbnail, Some("image/png")).unwrap();
        assert_eq!(png.extension(), "png");
    }

    #[test]
    fn test_thumbnail_rejects_everything_else() {
        for declared in ["image/gif", "image/webp", "video/mp4", "text/plain", "image", ""] {
            let result = validate_media_type(AssetKind::Thumbnail, Some(declared));
            assert!(result.is_err(), "`{}` should be rejected", declared);
        }
        assert!(validate_media_type(AssetKind::Thumbnail, None).is_err());
    }

    #[test]
    fn test_video_accepts_only_mp4() {
        let mp4 = validate_media_type(AssetKind::Video, Some("video/mp4")).unwrap();
        assert_eq!(mp4.extension(), "mp4");
        assert_eq!(mp4.kind(), AssetKind::Video);

        for declared in ["video/quicktime", "video/webm", "image/png", "application/mp4"] {
            assert!(validate_media_type(AssetKind::Video, Some(declared)).is_err());
        }
    }

    #[test]
    fn test_parameters_and_case_are_ignored() {
        let media = validate_media_type(AssetKind::Video, Some("Video/MP4; codecs=avc1")).unwrap();
        assert_eq!(media.essence(), "video/mp4");
    }

    #[test]
    fn test_rejection_reports_declared_type() {
        let err = validate_media_type(AssetKind::Thumbnail, Some("image/gif")).unwrap_err();
        assert_eq!(err.found, "image/gif");
        assert_eq!(err.to_string(), "unsupported thumbnail content type `image/gif`");
    }
}
