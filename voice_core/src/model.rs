//! The speech-model boundary.
//!
//! The synthesis engine is an external collaborator: given text, an
//! instruction string and a reference waveform, it produces a finite,
//! forward-only sequence of audio chunks. The sequence is consumed exactly
//! once per request; nothing in this crate buffers chunks beyond what
//! persistence requires.

use tokio::sync::mpsc;

/// Decoded mono audio in [-1.0, 1.0].
#[derive(Debug, Clone)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// One unit of synthesized audio emitted by the model during a request.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Sending half of a request's chunk stream.
pub type ChunkSender = mpsc::Sender<anyhow::Result<AudioChunk>>;

/// A pre-trained speech synthesis engine.
///
/// `synthesize_instruct` runs the whole synthesis for one request, pushing
/// chunks into `tx` in emission order. It blocks, so callers run it inside
/// `tokio::task::spawn_blocking` and consume the receiving half on the async
/// side. A mid-stream failure is reported by sending one `Err`; the stream
/// ends when the function returns and `tx` is dropped. Implementations stop
/// early if the receiver goes away.
pub trait SpeechModel: Send + Sync {
    /// Sample rate of the chunks this model emits.
    fn sample_rate(&self) -> u32;

    fn synthesize_instruct(&self, text: &str, instruct: &str, prompt: &Waveform, tx: ChunkSender);
}
