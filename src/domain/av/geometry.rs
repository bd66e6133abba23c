use serde_json::Value;
use std::fmt;

/// Absolute tolerance on `width / height` when matching 16:9 and 9:16.
pub const ASPECT_TOLERANCE: f64 = 0.02;

const LANDSCAPE: f64 = 16.0 / 9.0;
const PORTRAIT: f64 = 9.0 / 16.0;

/// Coarse aspect bucket used to namespace stored videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AspectClass {
    Landscape,
    Portrait,
    Other,
}

impl AspectClass {
    pub fn classify(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return AspectClass::Other;
        }
        let ratio = width as f64 / height as f64;
        if (ratio - LANDSCAPE).abs() <= ASPECT_TOLERANCE {
            AspectClass::Landscape
        } else if (ratio - PORTRAIT).abs() <= ASPECT_TOLERANCE {
            AspectClass::Portrait
        } else {
            AspectClass::Other
        }
    }

    /// Human label: `16:9`, `9:16` or `other`.
    pub fn label(self) -> &'static str {
        match self {
            AspectClass::Landscape => "16:9",
            AspectClass::Portrait => "9:16",
            AspectClass::Other => "other",
        }
    }

    /// Path segment used in storage keys.
    pub fn prefix(self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }
}

impl fmt::Display for AspectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Dimensions of the primary video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn aspect_class(&self) -> AspectClass {
        AspectClass::classify(self.width, self.height)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeParseError {
    #[error("ffprobe output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no video stream in probe output")]
    NoVideoStream,
    #[error("video stream is missing `{0}`")]
    MissingDimension(&'static str),
}

/// Reads the first video stream's size out of
/// `ffprobe -print_format json -show_streams` output.
pub fn parse_ffprobe_streams(stdout: &[u8]) -> Result<Geometry, ProbeParseError> {
    let probe: Value = serde_json::from_slice(stdout)?;
    let stream = probe
        .get("streams")
        .and_then(Value::as_array)
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.get("codec_type").and_then(Value::as_str) == Some("video"))
        })
        .ok_or(ProbeParseError::NoVideoStream)?;

    let dimension = |name: &'static str| {
        stream
            .get(name)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or(ProbeParseError::MissingDimension(name))
    };

    Ok(Geometry {
        width: dimension("width")?,
        height: dimension("height")?,
    })
}
