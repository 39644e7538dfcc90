//! Frame-based downward compression
//!
//! Levels above the threshold are pulled back toward it by `1 - damping`,
//! either against the framed peak amplitude or against the instantaneous
//! K-weighted loudness. Corrections are applied as Hann-windowed
//! multiplicative increments accumulated over overlapping frames, giving a
//! smoothly time-varying gain.

use silt_dsp::fetch_frame;
use silt_dsp::window::hann;

use crate::buffer::Waveform;
use crate::error::EngineResult;
use crate::loudness;

/// Compressor parameters
#[derive(Debug, Clone, Copy)]
pub struct CompressorParams {
    /// Threshold: linear amplitude in peak mode, LKFS in loudness mode
    pub threshold: f64,
    /// Damping ratio in [0, 1]; 0 clamps hard to the threshold, 1 is a no-op
    pub damping: f64,
    /// Gate on instantaneous loudness instead of framed peak
    pub loudness: bool,
}

/// Compress `wave` in place with frames of `2 * hop` samples centered at
/// multiples of `hop`.
pub fn compress(wave: &mut Waveform, params: &CompressorParams, hop: usize) -> EngineResult<()> {
    let n = wave.len();
    let frames = n / hop;
    if frames == 0 {
        return Ok(());
    }

    let meter = if params.loudness {
        Some(loudness::measure(&wave.samples, wave.sample_rate, hop)?)
    } else {
        None
    };

    let window = hann(2 * hop);
    let mut accumulator = vec![0.0f64; n];

    for i in 0..frames {
        let center = (i * hop) as isize;
        let frm = fetch_frame(&wave.samples, center, 2 * hop);

        let level = match &meter {
            None => frm.iter().map(|s| s.abs()).fold(0.0, f64::max),
            Some(m) => {
                let idx = (i as isize - 2).clamp(0, m.instantaneous.len() as isize - 1);
                m.instantaneous[idx as usize]
            }
        };

        if level <= params.threshold {
            continue;
        }
        let correction = (params.threshold - level) * (1.0 - params.damping);
        let increment = if params.loudness {
            10f64.powf(correction / 20.0) - 1.0
        } else {
            correction / (level + f64::EPSILON)
        };
        if increment == 0.0 {
            continue;
        }

        for (j, (&s, &w)) in frm.iter().zip(&window).enumerate() {
            let idx = center - hop as isize + j as isize;
            if idx >= 0 && (idx as usize) < n {
                accumulator[idx as usize] += s * w * increment;
            }
        }
    }

    for (s, a) in wave.samples.iter_mut().zip(&accumulator) {
        *s += a;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FrameGeometry, LOUDNESS_INTERVAL, PEAK_COMPRESS_INTERVAL};
    use crate::normalize::normalize_loudness;

    fn dc(len: usize, value: f64, rate: u32) -> Waveform {
        Waveform::new(vec![value; len], rate)
    }

    #[test]
    fn test_peak_mode_clamps_to_threshold() {
        let rate = 48000;
        let hop = FrameGeometry::time_domain(rate, PEAK_COMPRESS_INTERVAL, None).hop;
        let mut wave = dc(48000, 0.9, rate);

        let params = CompressorParams {
            threshold: 0.5,
            damping: 0.0,
            loudness: false,
        };
        compress(&mut wave, &params, hop).unwrap();

        // Full overlap-add coverage holds away from the tail.
        for i in 0..wave.len() - 2 * hop {
            assert!((wave.samples[i] - 0.5).abs() < 1e-9, "sample {i}: {}", wave.samples[i]);
        }
    }

    #[test]
    fn test_full_damping_is_a_no_op() {
        let rate = 48000;
        let hop = FrameGeometry::time_domain(rate, PEAK_COMPRESS_INTERVAL, None).hop;
        let mut wave = dc(24000, 0.9, rate);
        let original = wave.samples.clone();

        let params = CompressorParams {
            threshold: 0.5,
            damping: 1.0,
            loudness: false,
        };
        compress(&mut wave, &params, hop).unwrap();
        assert_eq!(wave.samples, original);
    }

    #[test]
    fn test_below_threshold_is_untouched() {
        let rate = 48000;
        let hop = FrameGeometry::time_domain(rate, PEAK_COMPRESS_INTERVAL, None).hop;
        let mut wave = dc(24000, 0.3, rate);
        let original = wave.samples.clone();

        let params = CompressorParams {
            threshold: 0.5,
            damping: 0.5,
            loudness: false,
        };
        compress(&mut wave, &params, hop).unwrap();
        assert_eq!(wave.samples, original);
    }

    #[test]
    fn test_loudness_mode_lands_between_threshold_and_input() {
        let rate = 48000u32;
        let samples: Vec<f64> = (0..96000)
            .map(|i| (2.0 * std::f64::consts::PI * 1000.0 * i as f64 / rate as f64).sin() * 0.5)
            .collect();
        let mut wave = Waveform::new(samples, rate);
        normalize_loudness(&mut wave, -10.0).unwrap();

        let hop = FrameGeometry::time_domain(rate, LOUDNESS_INTERVAL, None).hop;
        let params = CompressorParams {
            threshold: -20.0,
            damping: 0.5,
            loudness: true,
        };
        compress(&mut wave, &params, hop).unwrap();

        // 10 LU over the threshold, half damped: expect roughly -15 LKFS.
        let after = loudness::measure(&wave.samples, rate, hop).unwrap();
        assert!(
            after.integrated > -16.0 && after.integrated < -14.0,
            "integrated {}",
            after.integrated
        );
    }
}
