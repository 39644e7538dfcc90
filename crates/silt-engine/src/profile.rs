//! Noise profile codec
//!
//! On-disk layout: a little-endian f32 sample rate followed by FFT/2+1
//! little-endian f32 per-bin power values, so the file is exactly
//! `4 * (bins + 1)` bytes.

use std::io::{Read, Write};

use crate::error::{EngineError, EngineResult};

/// Per-bin noise power estimate tied to the sample rate it was measured at
#[derive(Debug, Clone)]
pub struct NoiseProfile {
    /// Sample rate the profile was captured at
    pub sample_rate: f32,
    /// Mean-squared magnitude per spectrum bin (FFT/2 + 1 values)
    pub bins: Vec<f32>,
}

impl NoiseProfile {
    /// Serialized size in bytes
    pub fn byte_len(&self) -> usize {
        4 * (self.bins.len() + 1)
    }

    /// Write the profile in its on-disk layout.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> EngineResult<()> {
        writer.write_all(&self.sample_rate.to_le_bytes())?;
        for value in &self.bins {
            writer.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    /// Read a profile and validate it against the current geometry.
    ///
    /// Fails when the payload size implies a bin count other than
    /// `expected_bins`, or when the stored sample rate is not exactly the
    /// current one.
    pub fn read_from<R: Read>(
        reader: &mut R,
        expected_bins: usize,
        sample_rate: u32,
    ) -> EngineResult<Self> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;

        let expected_len = 4 * (expected_bins + 1);
        if raw.len() != expected_len {
            return Err(EngineError::ProfileMismatch(format!(
                "expected {expected_bins} bins ({expected_len} bytes), file holds {} bytes",
                raw.len()
            )));
        }

        let mut values = raw
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]));
        let stored_rate = values.next().unwrap_or(0.0);
        if stored_rate != sample_rate as f32 {
            return Err(EngineError::ProfileMismatch(format!(
                "profile sample rate {stored_rate} does not match input rate {sample_rate}"
            )));
        }

        Ok(Self {
            sample_rate: stored_rate,
            bins: values.collect(),
        })
    }
}
