//! Noise profile analysis
//!
//! Averages the squared STFT magnitudes of a representative noise recording
//! into a per-bin power estimate for the spectral subtractor.

use silt_dsp::stft;

use crate::buffer::Waveform;
use crate::geometry::{FrameGeometry, HOP_FACTOR, PAD_FACTOR};
use crate::profile::NoiseProfile;

/// Build a noise profile from the whole of `wave`.
///
/// Each bin accumulates the squared magnitude over all frames; the sums are
/// divided by the bin count, the divisor existing profile files were
/// produced with.
pub fn analyze(wave: &Waveform, geometry: &FrameGeometry) -> NoiseProfile {
    let frames = geometry.frames(wave.len());
    let bins = geometry.bins();

    let spec = stft(&wave.samples, geometry.hop, frames, HOP_FACTOR, PAD_FACTOR);

    let mut mean = vec![0.0f64; bins];
    for row in &spec.magnitude {
        for (j, &m) in row.iter().enumerate() {
            mean[j] += m * m;
        }
    }

    NoiseProfile {
        sample_rate: wave.sample_rate as f32,
        bins: mean.iter().map(|&v| (v / bins as f64) as f32).collect(),
    }
}
