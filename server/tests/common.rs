//! Shared fixtures for the integration tests.

use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use server::config::ServerConfig;
use server::{app, AppState};
use voice_core::{AudioChunk, ChunkSender, OutputAssembler, SpeechModel, Waveform};

pub const TEST_URL_ROOT: &str = "http://localhost:8000";
pub const SAMPLES_PER_CHUNK: usize = 160;

/// A scripted model: emits a fixed number of chunks with distinct sample
/// values, then optionally reports a mid-stream failure.
pub struct ScriptedModel {
    pub chunks: usize,
    pub fail_after_chunks: bool,
}

impl ScriptedModel {
    pub fn yielding(chunks: usize) -> Self {
        Self {
            chunks,
            fail_after_chunks: false,
        }
    }

    pub fn failing_after(chunks: usize) -> Self {
        Self {
            chunks,
            fail_after_chunks: true,
        }
    }
}

impl SpeechModel for ScriptedModel {
    fn sample_rate(&self) -> u32 {
        24_000
    }

    fn synthesize_instruct(
        &self,
        _text: &str,
        _instruct: &str,
        _prompt: &Waveform,
        tx: ChunkSender,
    ) {
        for i in 0..self.chunks {
            let value = (i + 1) as f32 * 0.1;
            let chunk = AudioChunk {
                samples: vec![value; SAMPLES_PER_CHUNK],
                sample_rate: 24_000,
            };
            if tx.blocking_send(Ok(chunk)).is_err() {
                return;
            }
        }
        if self.fail_after_chunks {
            let _ = tx.blocking_send(Err(anyhow::anyhow!("model inference failed")));
        }
    }
}

pub struct TestServer {
    pub app: Router,
    pub output_dir: TempDir,
}

/// Build the real router around a scripted model and a temp output root.
pub fn test_app(model: ScriptedModel) -> TestServer {
    let output_dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        output_dir: output_dir.path().display().to_string(),
        output_url_root: TEST_URL_ROOT.to_string(),
        ..ServerConfig::default()
    };

    let state = AppState {
        model: Arc::new(model),
        default_prompt: Arc::new(Waveform {
            samples: vec![0.0; 1600],
            sample_rate: 16_000,
        }),
        assembler: OutputAssembler::new(output_dir.path()),
        config,
    };

    TestServer {
        app: app(state),
        output_dir,
    }
}
