//! Framed STFT/iSTFT with overlap-add synthesis
//!
//! Frames are centered at integer multiples of the hop length, windowed with
//! a periodic Hann of `hop * hop_factor` samples and zero-padded to
//! `hop * hop_factor * pad_factor` points. Synthesis overlap-adds the
//! analysis-windowed frames and divides by the normalization factor computed
//! by the forward transform (the hop-sampled window sum).

use realfft::RealFftPlanner;
use rustfft::num_complex::Complex;

use crate::frame::fetch_frame;
use crate::window::hann;

/// Magnitude/phase spectrogram produced by [`stft`].
pub struct Spectrogram {
    /// Per-frame bin magnitudes, `frames x (fft_size / 2 + 1)`
    pub magnitude: Vec<Vec<f64>>,
    /// Per-frame bin phases, same shape as `magnitude`
    pub phase: Vec<Vec<f64>>,
    /// Analysis hop in samples
    pub hop: usize,
    /// FFT length
    pub fft_size: usize,
    /// Analysis window length (`fft_size / pad_factor`)
    pub window_len: usize,
    /// Overlap-add normalization factor (hop-sampled window sum)
    pub norm_factor: f64,
}

impl Spectrogram {
    /// Number of frames
    pub fn frames(&self) -> usize {
        self.magnitude.len()
    }

    /// Number of bins per frame
    pub fn bins(&self) -> usize {
        self.fft_size / 2 + 1
    }
}

/// Forward short-time Fourier transform.
///
/// Analyzes `frames` frames of `x` centered at `i * hop`, zero-padding past
/// either end of the buffer.
pub fn stft(x: &[f64], hop: usize, frames: usize, hop_factor: usize, pad_factor: usize) -> Spectrogram {
    let window_len = hop * hop_factor;
    let fft_size = window_len * pad_factor;
    let bins = fft_size / 2 + 1;

    let window = hann(window_len);
    let norm_factor: f64 = (0..hop_factor).map(|k| window[k * hop]).sum();

    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(fft_size);
    let mut buffer = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();

    let mut magnitude = Vec::with_capacity(frames);
    let mut phase = Vec::with_capacity(frames);

    for i in 0..frames {
        let frm = fetch_frame(x, (i * hop) as isize, window_len);
        for j in 0..window_len {
            buffer[j] = frm[j] * window[j];
        }
        buffer[window_len..].fill(0.0);

        fft.process(&mut buffer, &mut spectrum).ok();

        let mut magn_row = Vec::with_capacity(bins);
        let mut phse_row = Vec::with_capacity(bins);
        for c in &spectrum {
            magn_row.push(c.norm());
            phse_row.push(c.arg());
        }
        magnitude.push(magn_row);
        phase.push(phse_row);
    }

    Spectrogram {
        magnitude,
        phase,
        hop,
        fft_size,
        window_len,
        norm_factor,
    }
}

/// Inverse short-time Fourier transform via overlap-add.
///
/// Returns `hop * frames` samples; frame content extending past either end
/// of that range is discarded.
pub fn istft(spec: &Spectrogram) -> Vec<f64> {
    let fft_size = spec.fft_size;
    let window_len = spec.window_len;
    let bins = spec.bins();
    let out_len = spec.hop * spec.frames();

    let mut planner = RealFftPlanner::<f64>::new();
    let ifft = planner.plan_fft_inverse(fft_size);
    let mut spectrum = ifft.make_input_vec();
    let mut buffer = ifft.make_output_vec();

    let mut out = vec![0.0; out_len];
    let scale = 1.0 / fft_size as f64;
    let half = (window_len / 2) as isize;

    for (i, (magn_row, phse_row)) in spec.magnitude.iter().zip(&spec.phase).enumerate() {
        for j in 0..bins {
            spectrum[j] = Complex::from_polar(magn_row[j], phse_row[j]);
        }
        // DC and Nyquist must be purely real for the inverse real transform.
        spectrum[0].im = 0.0;
        spectrum[bins - 1].im = 0.0;

        ifft.process(&mut spectrum, &mut buffer).ok();

        let center = (i * spec.hop) as isize;
        for j in 0..window_len {
            let idx = center - half + j as isize;
            if idx >= 0 && (idx as usize) < out_len {
                out[idx as usize] += buffer[j] * scale;
            }
        }
    }

    for s in &mut out {
        *s /= spec.norm_factor;
    }
    out
}
