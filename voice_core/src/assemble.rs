//! Per-request output assembly.
//!
//! Consumes the chunk stream of a single request, persists each chunk as a
//! numbered WAV file under a request-scoped directory and, when more than
//! one chunk was produced, appends the chunk files in index order into
//! `combined.wav`. Concurrency safety across requests comes entirely from
//! the unique request identifier namespacing the directory tree.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::model::AudioChunk;
use crate::wav;

/// Name of the concatenated file written when a request yields > 1 chunk.
pub const COMBINED_FILE: &str = "combined.wav";

/// Result of assembling one request's chunk stream.
#[derive(Debug, Clone)]
pub struct AssembledOutput {
    /// Path relative to the output root, e.g. `{id}/0.wav` or
    /// `{id}/combined.wav`.
    pub relative_path: String,
    /// Number of chunks the model produced.
    pub chunks: usize,
}

#[derive(Debug, Clone)]
pub struct OutputAssembler {
    root: PathBuf,
}

impl OutputAssembler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persist one request's chunk stream under `{root}/{request_id}`.
    ///
    /// Chunk files are numbered by emission order, zero-based, with no gaps.
    /// A failure mid-stream leaves the already-written chunk files in place
    /// and no combined file; there is no rollback. A stream that ends
    /// without a single chunk is an error, never a dangling reference.
    pub async fn assemble(
        &self,
        request_id: &str,
        mut rx: mpsc::Receiver<anyhow::Result<AudioChunk>>,
    ) -> anyhow::Result<AssembledOutput> {
        let dir = self.root.join(request_id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let mut count = 0usize;
        while let Some(item) = rx.recv().await {
            let chunk = item.with_context(|| format!("synthesis failed for request {request_id}"))?;
            let path = dir.join(format!("{count}.wav"));
            wav::write_wav(&path, &chunk.samples, chunk.sample_rate)
                .with_context(|| format!("Failed to persist chunk {count} of request {request_id}"))?;
            debug!(
                "request {request_id}: wrote chunk {count} ({} samples)",
                chunk.samples.len()
            );
            count += 1;
        }

        match count {
            0 => anyhow::bail!("model produced no audio for request {request_id}"),
            1 => Ok(AssembledOutput {
                relative_path: format!("{request_id}/0.wav"),
                chunks: 1,
            }),
            n => {
                self.combine(&dir, n)?;
                info!("request {request_id}: combined {n} chunks");
                Ok(AssembledOutput {
                    relative_path: format!("{request_id}/{COMBINED_FILE}"),
                    chunks: n,
                })
            }
        }
    }

    /// Append the persisted chunk files, in index order, into `combined.wav`.
    fn combine(&self, dir: &Path, count: usize) -> anyhow::Result<()> {
        let mut samples = Vec::new();
        let mut sample_rate = 0u32;
        for index in 0..count {
            let path = dir.join(format!("{index}.wav"));
            let (chunk, rate) = wav::read_wav(&path)
                .with_context(|| format!("Failed to read back chunk file {}", path.display()))?;
            sample_rate = rate;
            samples.extend(chunk);
        }
        wav::write_wav(dir.join(COMBINED_FILE), &samples, sample_rate)
            .with_context(|| format!("Failed to write {COMBINED_FILE} in {}", dir.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(value: f32, len: usize) -> AudioChunk {
        AudioChunk {
            samples: vec![value; len],
            sample_rate: 24_000,
        }
    }

    #[tokio::test]
    async fn single_chunk_references_first_file_without_combining() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = OutputAssembler::new(dir.path());

        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(chunk(0.25, 100))).await.unwrap();
        drop(tx);

        let out = assembler.assemble("req-a", rx).await.unwrap();
        assert_eq!(out.relative_path, "req-a/0.wav");
        assert_eq!(out.chunks, 1);
        assert!(dir.path().join("req-a/0.wav").is_file());
        assert!(!dir.path().join("req-a").join(COMBINED_FILE).exists());
    }

    #[tokio::test]
    async fn multiple_chunks_are_combined_in_emission_order() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = OutputAssembler::new(dir.path());

        let (tx, rx) = mpsc::channel(4);
        for value in [0.1, 0.2, 0.3] {
            tx.send(Ok(chunk(value, 100))).await.unwrap();
        }
        drop(tx);

        let out = assembler.assemble("req-b", rx).await.unwrap();
        assert_eq!(out.relative_path, format!("req-b/{COMBINED_FILE}"));
        assert_eq!(out.chunks, 3);

        for name in ["0.wav", "1.wav", "2.wav", COMBINED_FILE] {
            assert!(dir.path().join("req-b").join(name).is_file(), "missing {name}");
        }

        let (combined, rate) = wav::read_wav(dir.path().join("req-b").join(COMBINED_FILE)).unwrap();
        assert_eq!(rate, 24_000);
        assert_eq!(combined.len(), 300);
        assert!((combined[0] - 0.1).abs() < 1e-3);
        assert!((combined[100] - 0.2).abs() < 1e-3);
        assert!((combined[200] - 0.3).abs() < 1e-3);
    }

    #[tokio::test]
    async fn combined_file_matches_readback_of_chunk_files() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = OutputAssembler::new(dir.path());

        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(chunk(0.5, 64))).await.unwrap();
        tx.send(Ok(chunk(-0.5, 32))).await.unwrap();
        drop(tx);

        assembler.assemble("req-c", rx).await.unwrap();

        let (a, _) = wav::read_wav(dir.path().join("req-c/0.wav")).unwrap();
        let (b, _) = wav::read_wav(dir.path().join("req-c/1.wav")).unwrap();
        let (combined, _) =
            wav::read_wav(dir.path().join("req-c").join(COMBINED_FILE)).unwrap();

        let mut expected = a;
        expected.extend(b);
        assert_eq!(combined, expected);
    }

    #[tokio::test]
    async fn empty_stream_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = OutputAssembler::new(dir.path());

        let (tx, rx) = mpsc::channel::<anyhow::Result<AudioChunk>>(1);
        drop(tx);

        let err = assembler.assemble("req-d", rx).await.unwrap_err();
        assert!(err.to_string().contains("no audio"));
    }

    #[tokio::test]
    async fn mid_stream_error_leaves_partial_files_without_combined() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = OutputAssembler::new(dir.path());

        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(chunk(0.1, 50))).await.unwrap();
        tx.send(Err(anyhow::anyhow!("inference failed"))).await.unwrap();
        drop(tx);

        assert!(assembler.assemble("req-e", rx).await.is_err());
        assert!(dir.path().join("req-e/0.wav").is_file());
        assert!(!dir.path().join("req-e/1.wav").exists());
        assert!(!dir.path().join("req-e").join(COMBINED_FILE).exists());
    }
}
