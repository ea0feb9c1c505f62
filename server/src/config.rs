// Environment-derived configuration for the server

use std::path::{Path, PathBuf};

/// File name of the default reference prompt inside the assets directory.
pub const DEFAULT_PROMPT_FILE: &str = "zero_shot_prompt.wav";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub model_dir: String,
    pub assets_dir: String,
    pub output_dir: String,
    pub output_url_root: String,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            model_dir: "/data/models/CosyVoice2-0.5B".to_string(),
            assets_dir: "/data/assets".to_string(),
            output_dir: "/data/output".to_string(),
            output_url_root: "http://localhost:8000".to_string(),
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let model_dir = std::env::var("MODEL_DIR").unwrap_or(defaults.model_dir);
        let assets_dir = std::env::var("ASSETS_DIR").unwrap_or(defaults.assets_dir);
        let output_dir = std::env::var("OUTPUT_DIR").unwrap_or(defaults.output_dir);
        let output_url_root =
            std::env::var("OUTPUT_URL_ROOT").unwrap_or(defaults.output_url_root);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|origins| origins.split(',').map(|s| s.trim().to_string()).collect());

        Self {
            port,
            model_dir,
            assets_dir,
            output_dir,
            output_url_root,
            cors_allowed_origins,
        }
    }

    /// Location of the default reference prompt loaded at startup.
    pub fn default_prompt_path(&self) -> PathBuf {
        Path::new(&self.assets_dir).join(DEFAULT_PROMPT_FILE)
    }
}
