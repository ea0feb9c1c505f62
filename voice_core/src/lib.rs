//! Core library for the instruct TTS service: audio types, WAV I/O, the
//! speech-model boundary, the bundled Piper engine, and the per-request
//! output assembler.

mod assemble;
mod model;
mod piper;
mod wav;

pub use assemble::{AssembledOutput, OutputAssembler, COMBINED_FILE};
pub use model::{AudioChunk, ChunkSender, SpeechModel, Waveform};
pub use piper::{ModelLoadError, PiperModel};
pub use wav::{load_wav, read_wav, resample_linear, write_wav};
