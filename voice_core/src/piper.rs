//! Piper-backed speech model.
//!
//! Loads a Piper voice from a model directory and streams synthesized
//! sentence parts as audio chunks. Piper is a single-voice engine: it does
//! not condition on the instruction text or the reference waveform, so the
//! backend performs plain synthesis and records that at debug level.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use piper_rs::synth::PiperSpeechSynthesizer;
use tracing::debug;

use crate::model::{AudioChunk, ChunkSender, SpeechModel, Waveform};

/// Startup failure while loading a model directory. Fatal to the process:
/// the caller aborts before accepting traffic.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("no voice config in {0} (expected config.json or *.onnx.json)")]
    MissingConfig(PathBuf),

    #[error("failed to read {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid JSON")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is missing 'audio.sample_rate'")]
    MissingSampleRate(PathBuf),

    #[error("piper engine failed to load: {0}")]
    Engine(String),
}

pub struct PiperModel {
    synth: Mutex<PiperSpeechSynthesizer>,
    sample_rate: u32,
}

impl PiperModel {
    /// Load the voice found in `model_dir`.
    pub fn load<P: AsRef<Path>>(model_dir: P) -> Result<Self, ModelLoadError> {
        let cfg_path = find_voice_config(model_dir.as_ref())?;
        let sample_rate = read_sample_rate(&cfg_path)?;

        let model = piper_rs::from_config_path(&cfg_path)
            .map_err(|e| ModelLoadError::Engine(format!("{e}")))?;
        let synth =
            PiperSpeechSynthesizer::new(model).map_err(|e| ModelLoadError::Engine(format!("{e}")))?;

        Ok(Self {
            synth: Mutex::new(synth),
            sample_rate,
        })
    }
}

/// Locate the voice config JSON inside a model directory.
fn find_voice_config(dir: &Path) -> Result<PathBuf, ModelLoadError> {
    let direct = dir.join("config.json");
    if direct.is_file() {
        return Ok(direct);
    }

    let entries = fs::read_dir(dir).map_err(|source| ModelLoadError::ConfigRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ModelLoadError::ConfigRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_voice_cfg = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".onnx.json"));
        if is_voice_cfg {
            candidates.push(path);
        }
    }

    // Deterministic pick when a directory ships several voices.
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ModelLoadError::MissingConfig(dir.to_path_buf()))
}

/// Read the output sample rate from the voice config JSON.
fn read_sample_rate(cfg_path: &Path) -> Result<u32, ModelLoadError> {
    let text = fs::read_to_string(cfg_path).map_err(|source| ModelLoadError::ConfigRead {
        path: cfg_path.to_path_buf(),
        source,
    })?;
    let json: serde_json::Value =
        serde_json::from_str(&text).map_err(|source| ModelLoadError::ConfigParse {
            path: cfg_path.to_path_buf(),
            source,
        })?;

    json.get("audio")
        .and_then(|a| a.get("sample_rate"))
        .and_then(|sr| sr.as_u64())
        .map(|sr| sr as u32)
        .ok_or_else(|| ModelLoadError::MissingSampleRate(cfg_path.to_path_buf()))
}

impl SpeechModel for PiperModel {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn synthesize_instruct(&self, text: &str, _instruct: &str, _prompt: &Waveform, tx: ChunkSender) {
        debug!("piper voice is fixed; instruction and prompt audio do not condition synthesis");

        let synth = match self.synth.lock() {
            Ok(s) => s,
            Err(_) => {
                let _ = tx.blocking_send(Err(anyhow::anyhow!(
                    "synthesizer lock poisoned by a previous panic"
                )));
                return;
            }
        };

        let iter = match synth.synthesize_parallel(text.to_string(), None) {
            Ok(i) => i,
            Err(e) => {
                let _ = tx.blocking_send(Err(anyhow::anyhow!("piper synth error: {e}")));
                return;
            }
        };

        for part in iter {
            match part {
                Ok(samples) => {
                    let chunk = AudioChunk {
                        samples: samples.into_vec(),
                        sample_rate: self.sample_rate,
                    };
                    if tx.blocking_send(Ok(chunk)).is_err() {
                        // Receiver dropped, stop synthesizing.
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(Err(anyhow::anyhow!("chunk error: {e}")));
                    break;
                }
            }
        }
    }
}
