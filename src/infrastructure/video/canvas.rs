use crate::domain::error::Result;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Frames taller than this are scaled down; smaller frames are never upscaled.
pub const MAX_FRAME_HEIGHT: u32 = 720;

/// Output size for a native frame: height capped at [`MAX_FRAME_HEIGHT`],
/// width scaled by the same factor.
pub fn scaled_dimensions(width: u32, height: u32) -> (u32, u32) {
    if height == 0 {
        return (width.max(1), 1);
    }
    if height <= MAX_FRAME_HEIGHT {
        return (width.max(1), height);
    }
    let scale = MAX_FRAME_HEIGHT as f64 / height as f64;
    let scaled_width = ((width as f64 * scale).round() as u32).max(1);
    (scaled_width, MAX_FRAME_HEIGHT)
}

/// Reusable drawing surface. Resized to each frame's target size before drawing.
pub struct Canvas {
    surface: RgbImage,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            surface: RgbImage::new(1, 1),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.surface.dimensions()
    }

    pub fn draw_scaled(&mut self, source: &RgbImage, width: u32, height: u32) {
        if source.dimensions() == (width, height) {
            if self.surface.dimensions() == (width, height) {
                self.surface.copy_from_slice(source.as_raw());
            } else {
                self.surface = source.clone();
            }
            return;
        }
        self.surface = imageops::resize(source, width, height, FilterType::Triangle);
    }

    /// Encodes the current surface; `quality` is the JPEG scale 1..=100.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        encoder.encode_image(&self.surface)?;
        Ok(buffer)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}
