pub mod config;
pub mod error;
pub mod validation;

use std::{path::Path, sync::Arc};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use voice_core::{OutputAssembler, SpeechModel, Waveform};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::validation::validate_synthesis_request;

/// Sample rate every reference prompt is resampled to before it reaches the
/// model.
pub const PROMPT_SAMPLE_RATE: u32 = 16_000;

/// Chunk channel capacity between the synthesis task and the assembler.
const CHUNK_CHANNEL_CAPACITY: usize = 8;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn SpeechModel>,
    pub default_prompt: Arc<Waveform>,
    pub assembler: OutputAssembler,
    pub config: ServerConfig,
}

#[derive(Deserialize)]
pub struct SynthesisRequest {
    pub tts_text: String,
    pub instruct_text: String,
    #[serde(default)]
    pub prompt_wav: Option<String>,
}

#[derive(Serialize)]
pub struct SynthesisResponse {
    pub result: String,
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .into_inner();

    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/instruct2", post(instruct2))
        .layer(axum::middleware::from_fn(add_request_id))
        .layer(middleware_stack)
        .with_state(state)
}

// CORS configuration - environment-aware
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if let Some(ref allowed_origins) = config.cors_allowed_origins {
        let origins: Vec<axum::http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin: &String| origin.parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            warn!("CORS_ALLOWED_ORIGINS is empty, falling back to permissive CORS");
            permissive_cors()
        } else {
            info!("CORS configured for {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(tower_http::cors::AllowOrigin::list(origins))
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(tower_http::cors::Any)
                .allow_credentials(false)
        }
    } else {
        permissive_cors()
    }
}

fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(tower_http::cors::Any)
        .allow_credentials(false)
}

// Request ID middleware for tracing
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    request.headers_mut().insert(
        "x-request-id",
        axum::http::HeaderValue::from_str(&request_id).unwrap(),
    );
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        "x-request-id",
        axum::http::HeaderValue::from_str(&request_id).unwrap(),
    );
    response
}

pub async fn health_check() -> &'static str {
    "ok"
}

/// One end-to-end instruct synthesis request: resolve the reference prompt,
/// stream chunks from the model, assemble them on disk and return the
/// public URL of the result.
pub async fn instruct2(
    State(state): State<AppState>,
    Json(req): Json<SynthesisRequest>,
) -> Result<Json<SynthesisResponse>, ApiError> {
    validate_synthesis_request(&req.tts_text, &req.instruct_text)?;

    // An empty prompt path means "use the default", matching the truthiness
    // semantics upstream clients rely on. The prompt is resolved before any
    // output directory exists so a bad path leaves no artifacts behind.
    let prompt = match req.prompt_wav.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => {
            let wave = voice_core::load_wav(Path::new(path), PROMPT_SAMPLE_RATE)
                .map_err(|e| ApiError::PromptError(format!("cannot load {path}: {e}")))?;
            Arc::new(wave)
        }
        None => state.default_prompt.clone(),
    };

    // uuid4 hex: collision-resistant and filesystem-safe.
    let request_id = uuid::Uuid::new_v4().simple().to_string();
    info!(
        "request {request_id}: synthesizing {} chars of text",
        req.tts_text.len()
    );

    let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
    let model = state.model.clone();
    let text = req.tts_text.clone();
    let instruct = req.instruct_text.clone();
    let synthesis = tokio::task::spawn_blocking(move || {
        model.synthesize_instruct(&text, &instruct, &prompt, tx);
    });

    let assembled = state.assembler.assemble(&request_id, rx).await;

    if let Err(e) = synthesis.await {
        error!("request {request_id}: synthesis task panicked: {e}");
        return Err(ApiError::InternalError(format!(
            "synthesis task failed: {e}"
        )));
    }
    let assembled = assembled.map_err(ApiError::SynthesisError)?;

    info!(
        "request {request_id}: {} chunk(s) -> {}",
        assembled.chunks, assembled.relative_path
    );

    let result = format!(
        "{}/{}",
        state.config.output_url_root.trim_end_matches('/'),
        assembled.relative_path
    );
    Ok(Json(SynthesisResponse { result }))
}
