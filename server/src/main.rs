use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;

use server::config::ServerConfig;
use server::error::StartupError;
use server::{app, AppState, PROMPT_SAMPLE_RATE};
use voice_core::{OutputAssembler, PiperModel, SpeechModel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();

    let config = ServerConfig::from_env();
    info!(
        "Starting instruct TTS server: port={}, model_dir={}, output_dir={}",
        config.port, config.model_dir, config.output_dir
    );

    // Model load failures are fatal; the process never accepts traffic
    // without a working model.
    let model = PiperModel::load(&config.model_dir).map_err(|source| StartupError::ModelLoad {
        dir: config.model_dir.clone(),
        source,
    })?;
    info!("Speech model loaded, output rate {} Hz", model.sample_rate());

    let prompt_path = config.default_prompt_path();
    let default_prompt = voice_core::load_wav(&prompt_path, PROMPT_SAMPLE_RATE).map_err(|source| {
        StartupError::PromptLoad {
            path: prompt_path.display().to_string(),
            source,
        }
    })?;
    info!(
        "Default reference prompt loaded ({} samples at {} Hz)",
        default_prompt.samples.len(),
        default_prompt.sample_rate
    );

    let state = AppState {
        model: Arc::new(model),
        default_prompt: Arc::new(default_prompt),
        assembler: OutputAssembler::new(&config.output_dir),
        config: config.clone(),
    };

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT."))?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
