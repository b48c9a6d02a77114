//! Decode side of frame sampling.
//!
//! A [`VideoSurface`] exposes the two points a sampler waits on: metadata
//! becoming available and a seek completing. Callers must never drive one
//! surface from two sampling runs at once.

mod canvas;
mod ffmpeg;
mod temp_file;

pub use canvas::{scaled_dimensions, Canvas, MAX_FRAME_HEIGHT};
pub use ffmpeg::FfmpegVideoSurface;
pub use temp_file::TempVideoFile;

use crate::domain::error::Result;
use async_trait::async_trait;
use image::RgbImage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

/// A decoded picture at its actual position in the stream.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub image: RgbImage,
    pub timestamp_secs: f64,
}

#[async_trait]
pub trait VideoSurface: Send {
    /// Resolves once duration and native dimensions are known.
    async fn load_metadata(&mut self) -> Result<VideoMetadata>;

    /// Resolves once the seek to `offset_secs` has completed.
    async fn seek(&mut self, offset_secs: f64) -> Result<DecodedFrame>;

    /// Frees any temporary resource backing the surface. Idempotent.
    fn release(&mut self);
}
