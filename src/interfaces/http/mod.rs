use crate::application::use_cases::frame_sampler::SamplingOptions;
use crate::application::use_cases::video_analysis::{
    AnalysisRequest, VideoAnalysisUseCase, VideoInput,
};
use crate::domain::analysis::Progress;
use crate::domain::error::AppError;
use crate::domain::llm_config::LLMConfig;
use crate::domain::prompt::GenerationMode;
use crate::domain::test_case::{CsvExport, TestCaseView};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::csv::TestCaseParser;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::security::{resolve_api_key, CredentialStore};
use actix_cors::Cors;
use actix_web::{
    delete, dev::Server, get, post, put, web, App, HttpRequest, HttpResponse, HttpServer,
    Responder,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Header carrying a per-request key that overrides the stored one.
pub const API_KEY_HEADER: &str = "x-api-key";

const JSON_BODY_LIMIT: usize = 16 * 1024 * 1024;

pub type EnvLookup = fn(&str) -> Option<String>;

pub struct HttpState {
    pub analysis: Arc<VideoAnalysisUseCase>,
    pub llm_client: Arc<dyn LLMClient + Send + Sync>,
    pub credentials: Arc<dyn CredentialStore>,
    pub config: AppConfig,
    pub progress: watch::Sender<Progress>,
    /// Held for the duration of a generation; a second request is refused.
    pub run_guard: Mutex<()>,
    pub env_lookup: EnvLookup,
}

impl HttpState {
    pub fn new(
        analysis: Arc<VideoAnalysisUseCase>,
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        credentials: Arc<dyn CredentialStore>,
        config: AppConfig,
    ) -> Self {
        let (progress, _) = watch::channel(Progress::Idle);
        Self {
            analysis,
            llm_client,
            credentials,
            config,
            progress,
            run_guard: Mutex::new(()),
            env_lookup: |name| std::env::var(name).ok(),
        }
    }

    fn llm_config(&self, req: &HttpRequest) -> Result<LLMConfig, AppError> {
        let explicit = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());
        let api_key = resolve_api_key(explicit, self.credentials.as_ref(), self.env_lookup)?;

        let mut config = self.config.llm_config();
        config.api_key = api_key;
        Ok(config)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOptions {
    #[serde(default)]
    pub mode: GenerationMode,
    #[serde(default)]
    pub custom_instructions: Option<String>,
    #[serde(default)]
    pub frame_count: Option<u32>,
    #[serde(default)]
    pub quality: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFileRequest {
    pub path: String,
    #[serde(flatten)]
    pub options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
pub struct RawResultRequest {
    pub raw: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResponse {
    pub test_cases: Vec<TestCaseView>,
    pub valid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    pub stored: bool,
    pub available: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCredentialRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub stage: Progress,
    pub percent: u8,
}

fn error_response(err: &AppError) -> HttpResponse {
    if err.is_validation() {
        HttpResponse::BadRequest().body(err.to_string())
    } else {
        HttpResponse::InternalServerError().body(err.to_string())
    }
}

async fn run_analysis(
    data: &HttpState,
    req: &HttpRequest,
    video: VideoInput,
    options: GenerateOptions,
) -> HttpResponse {
    let Ok(_guard) = data.run_guard.try_lock() else {
        return HttpResponse::Conflict().body("An analysis is already running");
    };

    let config = match data.llm_config(req) {
        Ok(config) => config,
        Err(e) => return error_response(&e),
    };

    let request = AnalysisRequest {
        video,
        mode: options.mode,
        custom_instructions: options.custom_instructions,
        sampling: SamplingOptions {
            frame_count: options
                .frame_count
                .unwrap_or(data.config.sampling.frame_count),
            quality: options.quality.unwrap_or(data.config.sampling.quality),
        },
    };

    tracing::info!(
        mode = ?request.mode,
        frames = request.sampling.frame_count,
        model = %config.model,
        "Starting video analysis"
    );

    match data
        .analysis
        .execute(&config, request, &data.progress)
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => {
            tracing::error!(error = %e, "Generation failed");
            error_response(&e)
        }
    }
}

/// Video bytes as the raw body; options in the query string.
#[post("/generate")]
async fn generate(
    data: web::Data<HttpState>,
    req: HttpRequest,
    options: web::Query<GenerateOptions>,
    body: web::Bytes,
) -> impl Responder {
    run_analysis(
        &data,
        &req,
        VideoInput::Bytes(body.to_vec()),
        options.into_inner(),
    )
    .await
}

#[post("/generate/file")]
async fn generate_file(
    data: web::Data<HttpState>,
    req: HttpRequest,
    body: web::Json<GenerateFileRequest>,
) -> impl Responder {
    let body = body.into_inner();
    run_analysis(
        &data,
        &req,
        VideoInput::Path(PathBuf::from(body.path)),
        body.options,
    )
    .await
}

#[post("/parse")]
async fn parse_test_cases(body: web::Json<RawResultRequest>) -> impl Responder {
    let test_cases: Vec<TestCaseView> = TestCaseParser::new()
        .parse(&body.raw)
        .into_iter()
        .map(TestCaseView::from)
        .collect();
    let valid = !test_cases.is_empty();
    HttpResponse::Ok().json(ParseResponse { test_cases, valid })
}

#[post("/export/csv")]
async fn export_csv(body: web::Json<RawResultRequest>) -> impl Responder {
    let export = CsvExport::from_raw(&body.raw);
    HttpResponse::Ok()
        .content_type(export.media_type.as_str())
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", export.file_name),
        ))
        .body(export.body)
}

#[get("/credential")]
async fn credential_status(data: web::Data<HttpState>) -> impl Responder {
    let stored = match data.credentials.load() {
        Ok(key) => key.is_some(),
        Err(e) => return error_response(&e),
    };
    let available = match resolve_api_key(None, data.credentials.as_ref(), data.env_lookup) {
        Ok(key) => key.is_some(),
        Err(e) => return error_response(&e),
    };
    HttpResponse::Ok().json(CredentialStatus { stored, available })
}

#[put("/credential")]
async fn save_credential(
    data: web::Data<HttpState>,
    body: web::Json<SaveCredentialRequest>,
) -> impl Responder {
    match data.credentials.save(&body.api_key) {
        Ok(()) => {
            tracing::info!("Stored API key");
            HttpResponse::NoContent().finish()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to store API key");
            error_response(&e)
        }
    }
}

#[delete("/credential")]
async fn clear_credential(data: web::Data<HttpState>) -> impl Responder {
    match data.credentials.clear() {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}

#[get("/models")]
async fn list_models(data: web::Data<HttpState>, req: HttpRequest) -> impl Responder {
    let config = match data.llm_config(&req) {
        Ok(config) => config,
        Err(e) => return error_response(&e),
    };
    tracing::info!(base_url = %config.base_url, "Fetching models");

    match data.llm_client.list_models(&config).await {
        Ok(models) => HttpResponse::Ok().json(models),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list models");
            error_response(&e)
        }
    }
}

#[get("/progress")]
async fn progress_status(data: web::Data<HttpState>) -> impl Responder {
    let stage = *data.progress.borrow();
    HttpResponse::Ok().json(ProgressResponse {
        stage,
        percent: stage.percent(),
    })
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(generate)
            .service(generate_file)
            .service(parse_test_cases)
            .service(export_csv)
            .service(credential_status)
            .service(save_credential)
            .service(clear_credential)
            .service(list_models)
            .service(progress_status)
            .service(health),
    );
}

/// Only the configured browser origins may call the API; it can read local
/// files and spend the stored key.
pub fn cors(allowed_origins: &[String]) -> Cors {
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allow_any_header()
        .max_age(3600)
}

/// Uploads slightly over the limit still reach the handler so they get the
/// friendly size error instead of a bare 413.
fn payload_limit(max_upload_bytes: u64) -> usize {
    usize::try_from(max_upload_bytes.saturating_add(1024 * 1024)).unwrap_or(usize::MAX)
}

pub fn start_server(state: web::Data<HttpState>) -> std::io::Result<Server> {
    let host = state.config.server.host.clone();
    let port = state.config.server.port;
    let payload_limit = payload_limit(state.config.sampling.max_upload_bytes);
    let allowed_origins = state.config.server.allowed_origins.clone();

    tracing::info!(%host, port, origins = ?allowed_origins, "Starting HTTP server");

    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors(&allowed_origins))
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(payload_limit))
            .app_data(web::JsonConfig::default().limit(JSON_BODY_LIMIT))
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run();

    Ok(server)
}
