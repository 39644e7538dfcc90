//! LPC inverse filtering
//!
//! Block-wise linear prediction followed by residual synthesis: each frame
//! is whitened by its own prediction-error filter and the windowed residuals
//! are overlap-added into the replacement buffer. Strongly predictable
//! content (tonal, resonant) collapses toward zero while transients and
//! noise pass through.

use rand::Rng;
use silt_dsp::lpc::lpc;
use silt_dsp::window::hann;

use crate::buffer::Waveform;
use crate::error::{EngineError, EngineResult};

/// Amplitude of the uniform conditioning noise mixed into each analysis
/// segment, keeping the normal equations well-posed on silent stretches.
const CONDITIONING_AMPLITUDE: f64 = 1e-8;

/// Inverse filter parameters
#[derive(Debug, Clone, Copy)]
pub struct InverseFilterParams {
    /// Prediction order
    pub order: usize,
    /// Analysis window length in seconds
    pub window_sec: f64,
}

/// Inverse-filter `wave`, returning the residual as a replacement buffer of
/// the same length. Frames of `window_sec` are centered at multiples of
/// `hop`.
pub fn inverse_filter(
    wave: &Waveform,
    params: &InverseFilterParams,
    hop: usize,
) -> EngineResult<Vec<f64>> {
    let fs = wave.sample_rate as f64;
    let window_len = (params.window_sec * fs).round() as usize;
    let order = params.order;
    if order == 0 || window_len <= order {
        return Err(EngineError::Stage(format!(
            "inverse filter window of {window_len} samples cannot support order {order}"
        )));
    }

    let window = hann(window_len);
    let positions = (window_len / hop).max(1);
    let norm_factor: f64 = (0..positions).map(|k| window[(k * hop).min(window_len - 1)]).sum();
    if norm_factor <= 0.0 {
        return Err(EngineError::Stage(
            "frame hop too large for the analysis window".into(),
        ));
    }

    let x = &wave.samples;
    let n = x.len();
    let frames = n / hop;
    let half = (window_len / 2) as isize;
    let mut out = vec![0.0f64; n];
    let mut rng = rand::rng();

    for i in 0..frames {
        let center = (i * hop) as isize;
        let start = center - half - order as isize;

        let segment: Vec<f64> = (0..window_len + order)
            .map(|j| {
                let idx = start + j as isize;
                let s = if idx >= 0 && (idx as usize) < n {
                    x[idx as usize]
                } else {
                    0.0
                };
                s + rng.random_range(-CONDITIONING_AMPLITUDE..CONDITIONING_AMPLITUDE)
            })
            .collect();

        let a = lpc(&segment, order);

        for j in 0..window_len {
            let mut residual = segment[j + order];
            for k in 1..=order {
                residual += a[k] * segment[j + order - k];
            }
            let idx = center - half + j as isize;
            if idx >= 0 && (idx as usize) < n {
                out[idx as usize] += residual * window[j] / norm_factor;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FrameGeometry;

    fn energy(x: &[f64]) -> f64 {
        x.iter().map(|s| s * s).sum()
    }

    #[test]
    fn test_sine_residual_drops_twenty_db() {
        let rate = 48000u32;
        let samples: Vec<f64> = (0..rate as usize)
            .map(|i| (2.0 * std::f64::consts::PI * 440.0 * i as f64 / rate as f64).sin() * 0.5)
            .collect();
        let wave = Waveform::new(samples, rate);

        let params = InverseFilterParams {
            order: 12,
            window_sec: 0.025,
        };
        let hop = FrameGeometry::time_domain(rate, params.window_sec / 4.0, None).hop;
        let out = inverse_filter(&wave, &params, hop).unwrap();
        assert_eq!(out.len(), wave.len());

        let w = (params.window_sec * rate as f64).round() as usize;
        let input = energy(&wave.samples[w..wave.len() - w]);
        let residual = energy(&out[w..out.len() - w]);
        assert!(
            residual < 0.01 * input,
            "residual {residual} vs input {input}"
        );
    }

    #[test]
    fn test_noise_passes_mostly_through() {
        let rate = 48000u32;
        let mut state = 11u64;
        let samples: Vec<f64> = (0..24000)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0) * 0.1
            })
            .collect();
        let wave = Waveform::new(samples, rate);

        let params = InverseFilterParams {
            order: 8,
            window_sec: 0.02,
        };
        let hop = FrameGeometry::time_domain(rate, params.window_sec / 4.0, None).hop;
        let out = inverse_filter(&wave, &params, hop).unwrap();

        let w = (params.window_sec * rate as f64).round() as usize;
        let input = energy(&wave.samples[w..wave.len() - w]);
        let residual = energy(&out[w..out.len() - w]);
        // Whitening cannot flatten what is already white.
        assert!(residual > 0.2 * input && residual < 1.5 * input);
    }

    #[test]
    fn test_degenerate_window_is_rejected() {
        let wave = Waveform::new(vec![0.0; 4800], 48000);
        let params = InverseFilterParams {
            order: 12,
            window_sec: 0.0001,
        };
        assert!(inverse_filter(&wave, &params, 64).is_err());
    }
}
