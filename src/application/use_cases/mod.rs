pub mod frame_sampler;
pub mod prompts;
pub mod video_analysis;
