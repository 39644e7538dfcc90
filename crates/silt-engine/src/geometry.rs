//! Frame geometry resolution
//!
//! Every framed stage derives its hop from the sample rate and an optional
//! user-specified processing interval. STFT stages quantize the hop to a
//! power of two and analyze at `hop * 4` with 2x zero padding; time-domain
//! stages round the interval to whole samples.

/// STFT overlap factor (window length = hop * HOP_FACTOR)
pub const HOP_FACTOR: usize = 4;
/// STFT zero-padding factor (FFT length = window length * PAD_FACTOR)
pub const PAD_FACTOR: usize = 2;

/// Default analysis interval for spectral stages, in seconds
pub const SPECTRAL_INTERVAL: f64 = 0.004;
/// Default frame interval for the peak compressor, in seconds
pub const PEAK_COMPRESS_INTERVAL: f64 = 0.03;
/// Default block interval for loudness measurement, in seconds
pub const LOUDNESS_INTERVAL: f64 = 0.1;

/// Resolved per-stage framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Hop length in samples
    pub hop: usize,
    /// FFT length in samples (0 for time-domain stages)
    pub fft_size: usize,
}

impl FrameGeometry {
    /// Geometry for STFT stages (noise analysis, spectral subtraction).
    ///
    /// The default hop is the next power of two above `rate * 0.004`; a user
    /// interval overrides it as the power of two nearest `interval * rate`.
    pub fn stft(sample_rate: u32, interval: Option<f64>) -> Self {
        let fs = sample_rate as f64;
        let hop = match interval {
            None => (fs * SPECTRAL_INTERVAL).log2().ceil().exp2() as usize,
            Some(t) => (t * fs).log2().round().exp2() as usize,
        }
        .max(1);
        Self {
            sample_rate,
            hop,
            fft_size: hop * HOP_FACTOR * PAD_FACTOR,
        }
    }

    /// Geometry for time-domain stages (compressor, loudness meter, LPC).
    pub fn time_domain(sample_rate: u32, default_interval: f64, interval: Option<f64>) -> Self {
        let fs = sample_rate as f64;
        let hop = (interval.unwrap_or(default_interval) * fs).round().max(1.0) as usize;
        Self {
            sample_rate,
            hop,
            fft_size: 0,
        }
    }

    /// Frame count over a buffer of `len` samples
    pub fn frames(&self, len: usize) -> usize {
        len / self.hop
    }

    /// Spectrum bin count (FFT/2 + 1)
    pub fn bins(&self) -> usize {
        self.fft_size / 2 + 1
    }
}
