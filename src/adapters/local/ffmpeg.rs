use crate::domain::av::Geometry;
use crate::ports::media::MediaToolkit;
use crate::ports::PortError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

/// Runs the `ffmpeg` / `ffprobe` binaries. Children are killed if the request
/// future is dropped.
#[derive(Clone, Debug)]
pub struct FfmpegToolkit {
    ffmpeg: PathBuf,
    #[cfg_attr(feature = "libav", allow(dead_code))]
    ffprobe: PathBuf,
}

impl Default for FfmpegToolkit {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegToolkit {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    #[cfg(not(feature = "libav"))]
    async fn probe(&self, input: &Path) -> Result<Geometry, PortError> {
        let output = Command::new(&self.ffprobe)
            .arg("-v")
            .arg("error")
            .arg("-print_format")
            .arg("json")
            .arg("-show_streams")
            .arg(input)
            .kill_on_drop(true)
            .output()
            .await?;
        let output = check_status("ffprobe", output)?;
        Ok(crate::domain::av::geometry::parse_ffprobe_streams(&output.stdout)?)
    }

    #[cfg(feature = "libav")]
    async fn probe(&self, input: &Path) -> Result<Geometry, PortError> {
        libav::probe(input).await
    }
}

fn check_status(tool: &str, output: Output) -> Result<Output, PortError> {
    if output.status.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(format!("{} exited with {}: {}", tool, output.status, stderr.trim()).into())
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), PortError> {
        let result = Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(input)
            .arg("-c")
            .arg("copy")
            .arg("-movflags")
            .arg("faststart")
            .arg("-f")
            .arg("mp4")
            .arg(output)
            .kill_on_drop(true)
            .output()
            .await?;
        check_status("ffmpeg", result)?;
        Ok(())
    }

    async fn probe_geometry(&self, input: &Path) -> Result<Geometry, PortError> {
        self.probe(input).await
    }
}

#[cfg(feature = "libav")]
mod libav {
    use crate::domain::av::Geometry;
    use crate::ports::PortError;
    use ffmpeg_next as ffmpeg;
    use std::path::Path;

    pub async fn probe(input: &Path) -> Result<Geometry, PortError> {
        let source = input.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<Geometry, PortError> {
            ffmpeg::init()?;

            let ictx = ffmpeg::format::input(&source)?;
            let stream = ictx
                .streams()
                .best(ffmpeg::media::Type::Video)
                .ok_or(ffmpeg::Error::StreamNotFound)?;
            let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())?
                .decoder()
                .video()?;

            Ok(Geometry {
                width: decoder.width(),
                height: decoder.height(),
            })
        })
        .await?
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_remux_failure_carries_stderr() {
        let dir = tempdir().unwrap();
        let ffmpeg = script(dir.path(), "ffmpeg", "echo 'moov atom not found' >&2; exit 1");
        let toolkit = FfmpegToolkit::new(ffmpeg, "ffprobe");

        let err = toolkit
            .remux_fast_start(&dir.path().join("in.mp4"), &dir.path().join("out.mp4"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("moov atom not found"));
    }

    #[tokio::test]
    async fn test_remux_success() {
        let dir = tempdir().unwrap();
        let ffmpeg = script(dir.path(), "ffmpeg", "exit 0");
        let toolkit = FfmpegToolkit::new(ffmpeg, "ffprobe");

        let result = toolkit
            .remux_fast_start(&dir.path().join("in.mp4"), &dir.path().join("out.mp4"))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let dir = tempdir().unwrap();
        let toolkit = FfmpegToolkit::new(dir.path().join("no-ffmpeg"), dir.path().join("no-ffprobe"));

        let result = toolkit
            .remux_fast_start(&dir.path().join("in.mp4"), &dir.path().join("out.mp4"))
            .await;

        assert!(result.is_err());
    }

    #[cfg(not(feature = "libav"))]
    #[tokio::test]
    async fn test_probe_parses_ffprobe_json() {
        let dir = tempdir().unwrap();
        let ffprobe = script(
            dir.path(),
            "ffprobe",
            r#"echo '{"streams":[{"codec_type":"video","width":1920,"height":1080}]}'"#,
        );
        let toolkit = FfmpegToolkit::new("ffmpeg", ffprobe);

        let geometry = toolkit.probe_geometry(&dir.path().join("in.mp4")).await.unwrap();

        assert_eq!(geometry, Geometry { width: 1920, height: 1080 });
    }
}
