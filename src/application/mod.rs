pub mod use_cases;

pub use use_cases::frame_sampler::{FrameSampler, SamplingOptions};
pub use use_cases::video_analysis::{
    AnalysisRequest, FfmpegSurfaceFactory, SurfaceFactory, VideoAnalysisUseCase, VideoInput,
};
