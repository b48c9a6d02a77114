use crate::application::use_cases::frame_sampler::{FrameSampler, SamplingOptions};
use crate::application::use_cases::prompts::build_generation_prompt;
use crate::domain::analysis::{AnalysisOutcome, Progress};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::prompt::GenerationMode;
use crate::infrastructure::csv::TestCaseParser;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::clean_llm_response;
use crate::infrastructure::video::{FfmpegVideoSurface, VideoSurface};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use validator::Validate;

#[derive(Debug, Clone)]
pub enum VideoInput {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, Validate)]
pub struct AnalysisRequest {
    pub video: VideoInput,
    pub mode: GenerationMode,
    #[validate(length(max = 4096))]
    pub custom_instructions: Option<String>,
    pub sampling: SamplingOptions,
}

/// Opens a decode surface for one sampling run.
#[async_trait]
pub trait SurfaceFactory {
    async fn open(&self, video: &VideoInput) -> Result<Box<dyn VideoSurface>>;
}

pub struct FfmpegSurfaceFactory;

#[async_trait]
impl SurfaceFactory for FfmpegSurfaceFactory {
    async fn open(&self, video: &VideoInput) -> Result<Box<dyn VideoSurface>> {
        let surface = match video {
            VideoInput::Path(path) => FfmpegVideoSurface::from_path(path.clone()),
            VideoInput::Bytes(bytes) => FfmpegVideoSurface::from_bytes(bytes).await?,
        };
        Ok(Box::new(surface))
    }
}

pub struct VideoAnalysisUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    surfaces: Arc<dyn SurfaceFactory + Send + Sync>,
    sampler: FrameSampler,
    parser: TestCaseParser,
    max_upload_bytes: u64,
}

impl VideoAnalysisUseCase {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        surfaces: Arc<dyn SurfaceFactory + Send + Sync>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            llm_client,
            surfaces,
            sampler: FrameSampler::new(),
            parser: TestCaseParser::new(),
            max_upload_bytes,
        }
    }

    /// Samples the video, asks the model for the requested artifact and
    /// shapes its answer. Progress returns to `Idle` on any failure.
    pub async fn execute(
        &self,
        config: &LLMConfig,
        request: AnalysisRequest,
        progress: &watch::Sender<Progress>,
    ) -> Result<AnalysisOutcome> {
        let result = self.run(config, request, progress).await;
        match &result {
            Ok(_) => {
                progress.send_replace(Progress::Done);
            }
            Err(err) => {
                tracing::warn!(error = %err, "Video analysis failed");
                progress.send_replace(Progress::Idle);
            }
        }
        result
    }

    async fn run(
        &self,
        config: &LLMConfig,
        request: AnalysisRequest,
        progress: &watch::Sender<Progress>,
    ) -> Result<AnalysisOutcome> {
        progress.send_replace(Progress::Validating);
        self.validate(config, &request).await?;

        progress.send_replace(Progress::ExtractingFrames);
        let mut surface = self.surfaces.open(&request.video).await?;
        let frames = self
            .sampler
            .sample(surface.as_mut(), request.sampling)
            .await?;

        progress.send_replace(Progress::Analyzing);
        let prompt = build_generation_prompt(
            &frames,
            request.mode,
            request.custom_instructions.as_deref(),
        );
        let raw_result = self.llm_client.generate(config, &prompt).await?;

        let cleaned = clean_llm_response(&raw_result);
        if cleaned.is_empty() {
            return Err(AppError::LLMError(
                "No text generated from Gemini".to_string(),
            ));
        }

        let outcome = match request.mode {
            GenerationMode::TestCases => {
                let test_cases = self.parser.parse(&cleaned);
                tracing::info!(
                    frames = frames.len(),
                    test_cases = test_cases.len(),
                    "Generated test cases"
                );
                AnalysisOutcome {
                    mode: request.mode,
                    raw: cleaned,
                    frame_count: frames.len(),
                    test_cases: Some(test_cases),
                    markdown: None,
                }
            }
            GenerationMode::Documentation => {
                tracing::info!(
                    frames = frames.len(),
                    chars = cleaned.len(),
                    "Generated documentation"
                );
                AnalysisOutcome {
                    mode: request.mode,
                    raw: cleaned.clone(),
                    frame_count: frames.len(),
                    test_cases: None,
                    markdown: Some(cleaned),
                }
            }
        };

        Ok(outcome)
    }

    async fn validate(&self, config: &LLMConfig, request: &AnalysisRequest) -> Result<()> {
        let has_key = config
            .api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false);
        if !has_key {
            return Err(AppError::ValidationError(
                "Please provide your Gemini API key to continue.".to_string(),
            ));
        }

        request.validate()?;
        request.sampling.validate()?;

        let size = match &request.video {
            VideoInput::Bytes(bytes) => bytes.len() as u64,
            VideoInput::Path(path) => tokio::fs::metadata(path)
                .await
                .map_err(|e| {
                    AppError::ValidationError(format!(
                        "Video file {} is not readable: {}",
                        path.display(),
                        e
                    ))
                })?
                .len(),
        };

        if size == 0 {
            return Err(AppError::ValidationError("Video file is empty.".to_string()));
        }
        if size > self.max_upload_bytes {
            return Err(AppError::ValidationError(format!(
                "File size too large. Please upload a video under {}MB.",
                self.max_upload_bytes / (1024 * 1024)
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prompt::{GenerationPrompt, PromptPart};
    use crate::infrastructure::video::{DecodedFrame, VideoMetadata};
    use image::RgbImage;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct StaticSurface {
        released: Arc<AtomicBool>,
    }

    #[async_trait]
    impl VideoSurface for StaticSurface {
        async fn load_metadata(&mut self) -> Result<VideoMetadata> {
            Ok(VideoMetadata {
                duration_secs: 12.0,
                width: 64,
                height: 48,
            })
        }

        async fn seek(&mut self, offset_secs: f64) -> Result<DecodedFrame> {
            Ok(DecodedFrame {
                image: RgbImage::new(64, 48),
                timestamp_secs: offset_secs,
            })
        }

        fn release(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct StaticFactory {
        released: Arc<AtomicBool>,
        opened: AtomicBool,
    }

    #[async_trait]
    impl SurfaceFactory for StaticFactory {
        async fn open(&self, _video: &VideoInput) -> Result<Box<dyn VideoSurface>> {
            self.opened.store(true, Ordering::SeqCst);
            Ok(Box::new(StaticSurface {
                released: self.released.clone(),
            }))
        }
    }

    struct RecordingClient {
        response: Result<String>,
        prompts: Mutex<Vec<GenerationPrompt>>,
    }

    impl RecordingClient {
        fn replying(response: Result<String>) -> Arc<Self> {
            Arc::new(Self {
                response,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LLMClient for RecordingClient {
        async fn generate(&self, _config: &LLMConfig, prompt: &GenerationPrompt) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.clone());
            self.response.clone()
        }

        async fn list_models(&self, _config: &LLMConfig) -> Result<Vec<String>> {
            Ok(vec!["gemini-3-pro-preview".to_string()])
        }
    }

    fn request(mode: GenerationMode, frame_count: u32) -> AnalysisRequest {
        AnalysisRequest {
            video: VideoInput::Bytes(vec![0u8; 1024]),
            mode,
            custom_instructions: Some("Focus on login".to_string()),
            sampling: SamplingOptions {
                frame_count,
                quality: 0.8,
            },
        }
    }

    fn config() -> LLMConfig {
        LLMConfig::default().with_api_key("test-key")
    }

    #[tokio::test]
    async fn test_generates_and_parses_test_cases() {
        let client = RecordingClient::replying(Ok(
            "```csv\nTest Case ID,Test Scenario,Module Name,Case Type,Test Case Title,Pre-requisites,Test Steps,Expected Result (ER)\nTC-1,Login,Auth,Positive,Valid login,-,1. Sign in,Dashboard\nbroken,row\n```"
                .to_string(),
        ));
        let factory = Arc::new(StaticFactory::default());
        let use_case = VideoAnalysisUseCase::new(client.clone(), factory.clone(), 1024 * 1024);
        let (tx, rx) = watch::channel(Progress::Idle);

        let outcome = use_case
            .execute(&config(), request(GenerationMode::TestCases, 4), &tx)
            .await
            .unwrap();

        assert_eq!(outcome.frame_count, 4);
        assert!(outcome.raw.starts_with("Test Case ID"));
        let test_cases = outcome.test_cases.unwrap();
        assert_eq!(test_cases.len(), 1);
        assert_eq!(test_cases[0].id, "TC-1");
        assert_eq!(test_cases[0].owner, "-");
        assert!(outcome.markdown.is_none());
        assert_eq!(*rx.borrow(), Progress::Done);
        assert!(factory.released.load(Ordering::SeqCst));

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].image_count(), 4);
        assert_eq!(
            prompts[0].parts.last(),
            Some(&PromptPart::Text(
                "Additional Instructions: Focus on login\n\nAnalyze the provided video frames."
                    .to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_documentation_mode_returns_markdown() {
        let client = RecordingClient::replying(Ok("# Login - Knowledge Base Article\n\nBody".to_string()));
        let use_case =
            VideoAnalysisUseCase::new(client, Arc::new(StaticFactory::default()), 1024 * 1024);
        let (tx, _rx) = watch::channel(Progress::Idle);

        let outcome = use_case
            .execute(&config(), request(GenerationMode::Documentation, 2), &tx)
            .await
            .unwrap();

        assert!(outcome.test_cases.is_none());
        assert_eq!(
            outcome.markdown.as_deref(),
            Some("# Login - Knowledge Base Article\n\nBody")
        );
    }

    #[tokio::test]
    async fn test_unparseable_csv_is_not_an_error() {
        let client = RecordingClient::replying(Ok("I could not see any UI in this video.".to_string()));
        let use_case =
            VideoAnalysisUseCase::new(client, Arc::new(StaticFactory::default()), 1024 * 1024);
        let (tx, _rx) = watch::channel(Progress::Idle);

        let outcome = use_case
            .execute(&config(), request(GenerationMode::TestCases, 1), &tx)
            .await
            .unwrap();

        assert_eq!(outcome.test_cases, Some(Vec::new()));
        assert_eq!(outcome.raw, "I could not see any UI in this video.");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_sampling() {
        let client = RecordingClient::replying(Ok("unused".to_string()));
        let factory = Arc::new(StaticFactory::default());
        let use_case = VideoAnalysisUseCase::new(client.clone(), factory.clone(), 1024 * 1024);
        let (tx, rx) = watch::channel(Progress::Idle);

        let err = use_case
            .execute(&LLMConfig::default(), request(GenerationMode::TestCases, 2), &tx)
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(!factory.opened.load(Ordering::SeqCst));
        assert!(client.prompts.lock().unwrap().is_empty());
        assert_eq!(*rx.borrow(), Progress::Idle);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let client = RecordingClient::replying(Ok("unused".to_string()));
        let factory = Arc::new(StaticFactory::default());
        let use_case = VideoAnalysisUseCase::new(client, factory.clone(), 512);
        let (tx, _rx) = watch::channel(Progress::Idle);

        let err = use_case
            .execute(&config(), request(GenerationMode::TestCases, 2), &tx)
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(err.to_string().contains("File size too large"));
        assert!(!factory.opened.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_service_error_is_surfaced_verbatim() {
        let client = RecordingClient::replying(Err(AppError::LLMError(
            "API error (429 Too Many Requests): quota exceeded".to_string(),
        )));
        let use_case =
            VideoAnalysisUseCase::new(client, Arc::new(StaticFactory::default()), 1024 * 1024);
        let (tx, rx) = watch::channel(Progress::Idle);

        let err = use_case
            .execute(&config(), request(GenerationMode::TestCases, 2), &tx)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AppError::LLMError("API error (429 Too Many Requests): quota exceeded".to_string())
        );
        assert_eq!(*rx.borrow(), Progress::Idle);
    }

    #[tokio::test]
    async fn test_blank_response_is_an_error() {
        let client = RecordingClient::replying(Ok("<think>hmm</think>\n\n".to_string()));
        let use_case =
            VideoAnalysisUseCase::new(client, Arc::new(StaticFactory::default()), 1024 * 1024);
        let (tx, _rx) = watch::channel(Progress::Idle);

        let err = use_case
            .execute(&config(), request(GenerationMode::Documentation, 1), &tx)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::LLMError(_)));
    }
}
