use super::temp_file::TempVideoFile;
use super::{DecodedFrame, VideoMetadata, VideoSurface};
use crate::domain::error::{AppError, Result};
use async_trait::async_trait;
use image::RgbImage;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

static PTS_TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pts_time:\s*(-?[0-9]+(?:\.[0-9]+)?)").unwrap());

static FRAME_SIZE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bs:([0-9]+)x([0-9]+)").unwrap());

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug)]
enum VideoFile {
    Path(PathBuf),
    Temporary(TempVideoFile),
}

impl VideoFile {
    fn path(&self) -> &Path {
        match self {
            VideoFile::Path(path) => path,
            VideoFile::Temporary(file) => file.path(),
        }
    }
}

/// Decodes through the `ffprobe` / `ffmpeg` binaries, one process per seek.
pub struct FfmpegVideoSurface {
    file: VideoFile,
    metadata: Option<VideoMetadata>,
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl FfmpegVideoSurface {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::with_file(VideoFile::Path(path.into()))
    }

    /// Parks the bytes in a temporary file that lives until [`VideoSurface::release`].
    pub async fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file = TempVideoFile::create(bytes).await?;
        Ok(Self::with_file(VideoFile::Temporary(file)))
    }

    fn with_file(file: VideoFile) -> Self {
        Self {
            file,
            metadata: None,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }

    pub fn with_binaries(mut self, ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        self.ffmpeg_bin = ffmpeg.into();
        self.ffprobe_bin = ffprobe.into();
        self
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-show_entries".to_string(),
            "stream=width,height,duration:format=duration".to_string(),
            "-of".to_string(),
            "json".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    fn seek_args(path: &Path, offset_secs: f64) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            "info".to_string(),
            "-ss".to_string(),
            format!("{:.3}", offset_secs.max(0.0)),
            "-copyts".to_string(),
            "-i".to_string(),
            path.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-vf".to_string(),
            "showinfo".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "pipe:1".to_string(),
        ]
    }

    fn parse_probe(raw: &[u8]) -> Result<VideoMetadata> {
        let probe: ProbeOutput = serde_json::from_slice(raw)?;
        let stream = probe
            .streams
            .first()
            .ok_or_else(|| AppError::ParseError("no video stream found".to_string()))?;

        let duration = probe
            .format
            .as_ref()
            .and_then(|format| format.duration.as_deref())
            .or(stream.duration.as_deref())
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite() && *value > 0.0)
            .ok_or_else(|| AppError::ParseError("video has no readable duration".to_string()))?;

        let width = stream.width.unwrap_or(0);
        let height = stream.height.unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(AppError::ParseError(
                "video has no readable dimensions".to_string(),
            ));
        }

        Ok(VideoMetadata {
            duration_secs: duration,
            width,
            height,
        })
    }

    /// Position and size of the captured frame as logged by the `showinfo` filter.
    fn parse_showinfo(stderr: &str) -> (Option<f64>, Option<(u32, u32)>) {
        let line = stderr.lines().find(|line| line.contains("pts_time:"));
        let Some(line) = line else {
            return (None, None);
        };

        let timestamp = PTS_TIME_PATTERN
            .captures(line)
            .and_then(|captures| captures.get(1))
            .and_then(|value| value.as_str().parse::<f64>().ok());

        let size = FRAME_SIZE_PATTERN.captures(line).and_then(|captures| {
            let width = captures.get(1)?.as_str().parse::<u32>().ok()?;
            let height = captures.get(2)?.as_str().parse::<u32>().ok()?;
            Some((width, height))
        });

        (timestamp, size)
    }

    /// Probed size, swapped when the raw frame only fits the rotated orientation.
    fn fallback_size(metadata: &VideoMetadata, raw_len: usize) -> (u32, u32) {
        let (width, height) = (metadata.width, metadata.height);
        let expected = width as usize * height as usize * 3;
        if raw_len != expected && width != height {
            (height, width)
        } else {
            (width, height)
        }
    }

    fn last_line(stderr: &[u8]) -> String {
        String::from_utf8_lossy(stderr)
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("")
            .trim()
            .to_string()
    }
}

#[async_trait]
impl VideoSurface for FfmpegVideoSurface {
    async fn load_metadata(&mut self) -> Result<VideoMetadata> {
        if let Some(metadata) = self.metadata {
            return Ok(metadata);
        }

        let output = Command::new(&self.ffprobe_bin)
            .args(Self::probe_args(self.file.path()))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| AppError::IoError(format!("failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(AppError::Internal(format!(
                "ffprobe failed ({}): {}",
                output.status,
                Self::last_line(&output.stderr)
            )));
        }

        let metadata = Self::parse_probe(&output.stdout)?;
        tracing::debug!(
            path = %self.file.path().display(),
            duration = metadata.duration_secs,
            width = metadata.width,
            height = metadata.height,
            "Probed video metadata"
        );
        self.metadata = Some(metadata);
        Ok(metadata)
    }

    async fn seek(&mut self, offset_secs: f64) -> Result<DecodedFrame> {
        let metadata = self.load_metadata().await?;

        let output = Command::new(&self.ffmpeg_bin)
            .args(Self::seek_args(self.file.path(), offset_secs))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| AppError::IoError(format!("failed to execute ffmpeg: {}", e)))?;

        if !output.status.success() {
            return Err(AppError::Internal(format!(
                "ffmpeg seek to {:.3}s failed ({}): {}",
                offset_secs,
                output.status,
                Self::last_line(&output.stderr)
            )));
        }

        if output.stdout.is_empty() {
            return Err(AppError::Internal(format!(
                "no frame decoded at {:.3}s",
                offset_secs
            )));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let (timestamp, size) = Self::parse_showinfo(&stderr);
        let (width, height) =
            size.unwrap_or_else(|| Self::fallback_size(&metadata, output.stdout.len()));

        let image = RgbImage::from_raw(width, height, output.stdout).ok_or_else(|| {
            AppError::Internal(format!(
                "decoded frame at {:.3}s does not match {}x{}",
                offset_secs, width, height
            ))
        })?;

        Ok(DecodedFrame {
            image,
            timestamp_secs: timestamp.unwrap_or(offset_secs),
        })
    }

    fn release(&mut self) {
        if let VideoFile::Temporary(file) = &mut self.file {
            file.release();
        }
    }
}
