use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use tracing_subscriber::EnvFilter;

use crate::application::{FfmpegSurfaceFactory, VideoAnalysisUseCase};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::llm_clients::{GeminiClient, LLMClient};
use crate::infrastructure::security::KeyringCredentialStore;
use crate::interfaces::http::{start_server, HttpState};

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn run() -> std::io::Result<()> {
    let config = AppConfig::load().map_err(std::io::Error::other)?;
    init_tracing(&config);

    let llm_client: Arc<dyn LLMClient + Send + Sync> = Arc::new(GeminiClient::with_timeout(
        Duration::from_secs(config.llm.timeout_secs),
    ));
    let analysis = Arc::new(VideoAnalysisUseCase::new(
        llm_client.clone(),
        Arc::new(FfmpegSurfaceFactory),
        config.sampling.max_upload_bytes,
    ));
    let state = web::Data::new(HttpState::new(
        analysis,
        llm_client,
        Arc::new(KeyringCredentialStore::new()),
        config,
    ));

    actix_web::rt::System::new().block_on(async move { start_server(state)?.await })
}
