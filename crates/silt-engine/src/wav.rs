//! PCM WAV input/output
//!
//! Decodes a WAV stream into the working buffer and encodes the processed
//! buffer back with the source's sample rate, bit depth and sample format.
//! Multi-channel input is averaged down to mono; encoding goes through an
//! in-memory cursor so non-seekable sinks (stdout, pipes) work.

use std::io::{Cursor, Read, Write};

use crate::buffer::{SampleFormat, Waveform};
use crate::error::{EngineError, EngineResult};

/// Decode a WAV stream into a mono waveform.
pub fn read_wav<R: Read>(reader: R) -> EngineResult<Waveform> {
    let reader = hound::WavReader::new(reader)
        .map_err(|e| EngineError::InputRead(e.to_string()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .filter_map(|s| s.ok())
                .map(|s| s as f64 / max_val)
                .collect()
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .filter_map(|s| s.ok())
            .map(|s| s as f64)
            .collect(),
    };

    let mono = if channels == 1 {
        samples
    } else {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f64>() / frame.len() as f64)
            .collect()
    };

    Ok(Waveform {
        samples: mono,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        sample_format: match spec.sample_format {
            hound::SampleFormat::Int => SampleFormat::Int,
            hound::SampleFormat::Float => SampleFormat::Float,
        },
    })
}

/// Encode the waveform as mono WAV and write it to `writer`.
pub fn write_wav<W: Write>(mut writer: W, wave: &Waveform) -> EngineResult<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: wave.sample_rate,
        bits_per_sample: wave.bits_per_sample,
        sample_format: match wave.sample_format {
            SampleFormat::Int => hound::SampleFormat::Int,
            SampleFormat::Float => hound::SampleFormat::Float,
        },
    };

    let mut encoded = Vec::new();
    {
        let cursor = Cursor::new(&mut encoded);
        let mut wav = hound::WavWriter::new(cursor, spec)
            .map_err(|e| EngineError::OutputWrite(e.to_string()))?;

        match (wave.sample_format, wave.bits_per_sample) {
            (SampleFormat::Float, 32) => {
                for &s in &wave.samples {
                    wav.write_sample(s as f32)
                        .map_err(|e| EngineError::OutputWrite(e.to_string()))?;
                }
            }
            (SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
                let max_val = ((1i64 << (bits - 1)) - 1) as f64;
                for &s in &wave.samples {
                    let v = (s.clamp(-1.0, 1.0) * max_val) as i32;
                    wav.write_sample(v)
                        .map_err(|e| EngineError::OutputWrite(e.to_string()))?;
                }
            }
            (_, bits) => {
                return Err(EngineError::OutputWrite(format!(
                    "unsupported bit depth: {bits}"
                )));
            }
        }

        wav.finalize()
            .map_err(|e| EngineError::OutputWrite(e.to_string()))?;
    }

    writer.write_all(&encoded)?;
    Ok(())
}
