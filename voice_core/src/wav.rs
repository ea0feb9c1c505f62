//! WAV decode/encode helpers built on `hound`.
//!
//! Everything here works with mono f32 samples in [-1.0, 1.0]. Files are
//! written as 16-bit PCM RIFF so every persisted chunk is individually
//! playable.

use std::path::Path;

use anyhow::Context;

use crate::model::Waveform;

/// Load a WAV file, downmix to mono and resample to `target_rate`.
pub fn load_wav<P: AsRef<Path>>(path: P, target_rate: u32) -> anyhow::Result<Waveform> {
    let (samples, source_rate) = decode_f32_mono(path.as_ref())?;
    let samples = resample_linear(&samples, source_rate, target_rate);
    Ok(Waveform {
        samples,
        sample_rate: target_rate,
    })
}

/// Decode a WAV file to mono f32 samples at its native rate.
pub fn read_wav<P: AsRef<Path>>(path: P) -> anyhow::Result<(Vec<f32>, u32)> {
    decode_f32_mono(path.as_ref())
}

fn decode_f32_mono(path: &Path) -> anyhow::Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open wav file: {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("Bad float sample in {}", path.display()))?,
        hound::SampleFormat::Int => {
            // 16/24/32-bit integer PCM, read through i32 and normalized.
            let max = (1u64 << spec.bits_per_sample.saturating_sub(1)) as f32;
            let mut out = Vec::with_capacity(reader.len() as usize);
            for s in reader.samples::<i32>() {
                let v = s.with_context(|| format!("Bad sample in {}", path.display()))? as f32;
                out.push((v / max).clamp(-1.0, 1.0));
            }
            out
        }
    };

    if channels == 1 {
        return Ok((interleaved, spec.sample_rate));
    }

    // Multi-channel prompts are rare but legal; average down to mono.
    let mut mono = Vec::with_capacity(interleaved.len() / channels);
    for frame in interleaved.chunks_exact(channels) {
        mono.push(frame.iter().sum::<f32>() / channels as f32);
    }
    Ok((mono, spec.sample_rate))
}

/// Linear-interpolation resampler.
pub fn resample_linear(input: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if src_rate == dst_rate || input.is_empty() {
        return input.to_vec();
    }

    let ratio = dst_rate as f64 / src_rate as f64;
    let output_len = (input.len() as f64 * ratio).ceil() as usize;
    let inv_ratio = src_rate as f64 / dst_rate as f64;

    let mut output = Vec::with_capacity(output_len);
    for i in 0..output_len {
        let src_pos = i as f64 * inv_ratio;
        let idx = src_pos as usize;
        if idx + 1 >= input.len() {
            output.push(*input.last().unwrap_or(&0.0));
        } else {
            let frac = (src_pos - idx as f64) as f32;
            output.push(input[idx] + (input[idx + 1] - input[idx]) * frac);
        }
    }
    output
}

/// Write mono f32 samples as a 16-bit PCM WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> anyhow::Result<()> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create wav file: {}", path.display()))?;
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(v)
            .with_context(|| format!("Failed to write sample to {}", path.display()))?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize {}", path.display()))?;
    Ok(())
}
