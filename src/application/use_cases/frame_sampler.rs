use crate::domain::error::{AppError, Result};
use crate::domain::frame::Frame;
use crate::infrastructure::video::{scaled_dimensions, Canvas, VideoSurface};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// How many frames to take and how hard to compress them.
///
/// `frame_count` has no upper bound: dense sampling is allowed, at the cost
/// of run time and request size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct SamplingOptions {
    #[validate(range(min = 1))]
    pub frame_count: u32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub quality: f32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            frame_count: 10,
            quality: 0.8,
        }
    }
}

/// Evenly spaced offsets `i * duration / count` for `i` in `0..count`.
/// The last offset is always strictly before the end of the video.
/// Produced lazily, one per seek.
pub fn sample_offsets(duration_secs: f64, frame_count: u32) -> impl Iterator<Item = f64> {
    let interval = if frame_count == 0 {
        0.0
    } else {
        duration_secs / frame_count as f64
    };
    (0..frame_count).map(move |i| i as f64 * interval)
}

/// Maps a 0..=1 quality factor onto the JPEG 1..=100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    (quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FrameSampler;

impl FrameSampler {
    pub fn new() -> Self {
        Self
    }

    /// Captures `options.frame_count` frames, one seek at a time.
    ///
    /// The surface is released whether or not sampling succeeds. Any decode
    /// or encode failure aborts the run with a single sampling error and no
    /// partial result.
    pub async fn sample<S>(&self, surface: &mut S, options: SamplingOptions) -> Result<Vec<Frame>>
    where
        S: VideoSurface + ?Sized,
    {
        let result = match options.validate() {
            Ok(()) => Self::capture_all(surface, options).await,
            Err(err) => Err(err.into()),
        };
        surface.release();

        result.map_err(|err| match err {
            AppError::ValidationError(_) | AppError::SamplingError(_) => err,
            other => {
                tracing::error!(error = %other, "Frame sampling aborted");
                AppError::sampling(other)
            }
        })
    }

    async fn capture_all<S>(surface: &mut S, options: SamplingOptions) -> Result<Vec<Frame>>
    where
        S: VideoSurface + ?Sized,
    {
        let metadata = surface.load_metadata().await?;
        if !metadata.duration_secs.is_finite() || metadata.duration_secs <= 0.0 {
            return Err(AppError::Internal(
                "video has no readable duration".to_string(),
            ));
        }

        let quality = jpeg_quality(options.quality);

        tracing::info!(
            duration = metadata.duration_secs,
            native_width = metadata.width,
            native_height = metadata.height,
            frames = options.frame_count,
            "Sampling video frames"
        );

        let mut canvas = Canvas::new();
        let mut frames = Vec::new();

        let offsets = sample_offsets(metadata.duration_secs, options.frame_count);
        for (index, offset) in offsets.enumerate() {
            let decoded = surface.seek(offset).await?;

            // Decoded frames may be display-rotated relative to the probed size.
            let (width, height) =
                scaled_dimensions(decoded.image.width(), decoded.image.height());
            canvas.draw_scaled(&decoded.image, width, height);
            let jpeg = canvas.encode_jpeg(quality)?;

            let (out_width, out_height) = canvas.dimensions();
            tracing::debug!(
                index,
                requested = offset,
                actual = decoded.timestamp_secs,
                width = out_width,
                height = out_height,
                bytes = jpeg.len(),
                "Captured frame"
            );

            frames.push(Frame::from_jpeg(&jpeg, decoded.timestamp_secs));
        }

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::video::{DecodedFrame, VideoMetadata};
    use async_trait::async_trait;
    use image::RgbImage;

    /// Decoder double that snaps each seek up to the next `snap` boundary.
    struct ScriptedSurface {
        metadata: VideoMetadata,
        snap: f64,
        decoded_size: Option<(u32, u32)>,
        fail_at: Option<usize>,
        requested: Vec<f64>,
        released: bool,
    }

    impl ScriptedSurface {
        fn new(duration_secs: f64, width: u32, height: u32) -> Self {
            Self {
                metadata: VideoMetadata {
                    duration_secs,
                    width,
                    height,
                },
                snap: 0.0,
                decoded_size: None,
                fail_at: None,
                requested: Vec::new(),
                released: false,
            }
        }
    }

    #[async_trait]
    impl VideoSurface for ScriptedSurface {
        async fn load_metadata(&mut self) -> Result<VideoMetadata> {
            Ok(self.metadata)
        }

        async fn seek(&mut self, offset_secs: f64) -> Result<DecodedFrame> {
            if self.fail_at == Some(self.requested.len()) {
                return Err(AppError::Internal("decoder error".to_string()));
            }
            self.requested.push(offset_secs);

            let timestamp_secs = if self.snap > 0.0 {
                (offset_secs / self.snap).ceil() * self.snap
            } else {
                offset_secs
            };

            let (width, height) = self
                .decoded_size
                .unwrap_or((self.metadata.width, self.metadata.height));
            Ok(DecodedFrame {
                image: RgbImage::from_pixel(width, height, image::Rgb([30, 60, 90])),
                timestamp_secs,
            })
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    fn options(frame_count: u32) -> SamplingOptions {
        SamplingOptions {
            frame_count,
            quality: 0.8,
        }
    }

    #[test]
    fn test_sample_offsets() {
        let offsets: Vec<f64> = sample_offsets(30.0, 6).collect();
        assert_eq!(offsets, vec![0.0, 5.0, 10.0, 15.0, 20.0, 25.0]);
        assert_eq!(sample_offsets(10.0, 1).collect::<Vec<_>>(), vec![0.0]);
        assert_eq!(sample_offsets(10.0, 0).count(), 0);

        let offsets: Vec<f64> = sample_offsets(7.3, 9).collect();
        assert_eq!(offsets.len(), 9);
        assert!(offsets.iter().all(|offset| *offset < 7.3));
    }

    #[test]
    fn test_huge_frame_count_is_lazy() {
        let mut offsets = sample_offsets(60.0, u32::MAX);
        assert_eq!(offsets.size_hint().0, u32::MAX as usize);
        assert_eq!(offsets.next(), Some(0.0));
        assert!(offsets.next().unwrap() > 0.0);
    }

    #[test]
    fn test_jpeg_quality_mapping() {
        assert_eq!(jpeg_quality(0.8), 80);
        assert_eq!(jpeg_quality(1.0), 100);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(0.925), 93);
    }

    #[tokio::test]
    async fn test_thirty_second_video_six_frames() {
        let mut surface = ScriptedSurface::new(30.0, 320, 180);
        surface.snap = 0.5;

        let frames = FrameSampler::new()
            .sample(&mut surface, options(6))
            .await
            .unwrap();

        assert_eq!(surface.requested, vec![0.0, 5.0, 10.0, 15.0, 20.0, 25.0]);
        assert_eq!(frames.len(), 6);
        for (frame, requested) in frames.iter().zip(surface.requested.iter()) {
            assert!((frame.timestamp_secs - requested).abs() <= 0.5);
            assert_eq!(frame.mime_type, "image/jpeg");
        }
        assert!(surface.released);
    }

    #[tokio::test]
    async fn test_records_actual_timestamps_in_order() {
        let mut surface = ScriptedSurface::new(10.0, 64, 64);
        surface.snap = 1.0;

        let frames = FrameSampler::new()
            .sample(&mut surface, options(7))
            .await
            .unwrap();

        let timestamps: Vec<f64> = frames.iter().map(|frame| frame.timestamp_secs).collect();
        assert_eq!(timestamps, vec![0.0, 2.0, 3.0, 5.0, 6.0, 8.0, 9.0]);
        assert!(timestamps.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test]
    async fn test_tall_video_is_downscaled() {
        let mut surface = ScriptedSurface::new(4.0, 1920, 1080);

        let frames = FrameSampler::new()
            .sample(&mut surface, options(2))
            .await
            .unwrap();

        for frame in &frames {
            let jpeg = frame.decoded_bytes().unwrap();
            let decoded = image::load_from_memory(&jpeg).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (1280, 720));
        }
    }

    #[tokio::test]
    async fn test_rotated_frames_keep_their_aspect_ratio() {
        // Probe reports the coded landscape size; the decoder hands back portrait frames.
        let mut surface = ScriptedSurface::new(4.0, 1920, 1080);
        surface.decoded_size = Some((1080, 1920));

        let frames = FrameSampler::new()
            .sample(&mut surface, options(2))
            .await
            .unwrap();

        for frame in &frames {
            let decoded = image::load_from_memory(&frame.decoded_bytes().unwrap()).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (405, 720));
        }
    }

    #[tokio::test]
    async fn test_small_video_is_not_upscaled() {
        let mut surface = ScriptedSurface::new(4.0, 320, 240);

        let frames = FrameSampler::new()
            .sample(&mut surface, options(1))
            .await
            .unwrap();

        let decoded = image::load_from_memory(&frames[0].decoded_bytes().unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[tokio::test]
    async fn test_dense_sampling_is_not_capped() {
        let mut surface = ScriptedSurface::new(2.0, 16, 16);

        let frames = FrameSampler::new()
            .sample(&mut surface, options(120))
            .await
            .unwrap();

        assert_eq!(frames.len(), 120);
        assert!(surface.requested.iter().all(|offset| *offset < 2.0));
    }

    #[tokio::test]
    async fn test_seek_failure_aborts_and_releases() {
        let mut surface = ScriptedSurface::new(10.0, 64, 64);
        surface.fail_at = Some(2);

        let err = FrameSampler::new()
            .sample(&mut surface, options(5))
            .await
            .unwrap_err();

        match err {
            AppError::SamplingError(message) => {
                assert!(message.starts_with("Frame sampling failed:"));
                assert!(message.contains("decoder error"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(surface.requested.len(), 2);
        assert!(surface.released);
    }

    #[tokio::test]
    async fn test_zero_duration_fails() {
        let mut surface = ScriptedSurface::new(0.0, 64, 64);

        let err = FrameSampler::new()
            .sample(&mut surface, options(3))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SamplingError(_)));
        assert!(surface.requested.is_empty());
        assert!(surface.released);
    }

    #[tokio::test]
    async fn test_invalid_options_are_rejected() {
        let mut surface = ScriptedSurface::new(10.0, 64, 64);
        let err = FrameSampler::new()
            .sample(&mut surface, options(0))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = FrameSampler::new()
            .sample(
                &mut surface,
                SamplingOptions {
                    frame_count: 3,
                    quality: 1.5,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(surface.requested.is_empty());
    }
}
