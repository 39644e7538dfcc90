//! Spectral subtraction
//!
//! Per-frame gain derived from a noise profile, with a bandwidth-smoothed
//! floor: the raw subtraction gain suppresses bins dominated by noise, the
//! square-rooted moving average of it keeps isolated deep notches from
//! turning into musical noise.

use silt_dsp::smoothing::moving_avg;
use silt_dsp::{istft, stft};

use crate::buffer::Waveform;
use crate::error::EngineResult;
use crate::geometry::{FrameGeometry, HOP_FACTOR, PAD_FACTOR};
use crate::profile::NoiseProfile;

/// Spectral subtraction parameters
#[derive(Debug, Clone, Copy)]
pub struct DenoiseParams {
    /// Noise power multiplier (1.0 subtracts the profiled estimate)
    pub rate: f64,
    /// Gain smoothing bandwidth in Hz
    pub bandwidth: f64,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            rate: 1.0,
            bandwidth: 500.0,
        }
    }
}

/// Subtract the profiled noise spectrum from `wave`.
///
/// Returns a replacement buffer of `hop * frames` samples reconstructed from
/// the gained magnitudes and the original phases.
pub fn denoise(
    wave: &Waveform,
    profile: &NoiseProfile,
    params: &DenoiseParams,
    geometry: &FrameGeometry,
) -> EngineResult<Vec<f64>> {
    let frames = geometry.frames(wave.len());
    let bins = geometry.bins();

    let mut spec = stft(&wave.samples, geometry.hop, frames, HOP_FACTOR, PAD_FACTOR);

    let smoothing_bins =
        params.bandwidth / wave.sample_rate as f64 * geometry.fft_size as f64 / 2.0;
    let mut gain = vec![0.0f64; bins];

    for row in &mut spec.magnitude {
        for (j, g) in gain.iter_mut().enumerate() {
            let power = row[j] * row[j] + f64::EPSILON;
            *g = (1.0 - profile.bins[j] as f64 * params.rate / power).max(0.0);
        }
        let smoothed = moving_avg(&gain, smoothing_bins);
        for (j, m) in row.iter_mut().enumerate() {
            *m *= gain[j].max(smoothed[j].sqrt());
        }
    }

    Ok(istft(&spec))
}
