//! silt-dsp: signal-processing primitives for the silt toolkit
//!
//! Building blocks consumed by the processing engine:
//! - `window` - analysis windows
//! - `frame` - centered frame extraction with zero padding
//! - `fft` - framed STFT/iSTFT with overlap-add synthesis
//! - `filter` - direct-form IIR filtering
//! - `smoothing` - moving average with fractional window lengths
//! - `lpc` - linear predictive coding (autocorrelation + Levinson-Durbin)
//! - `resample` - offline sample rate conversion

mod error;
pub mod fft;
pub mod filter;
pub mod frame;
pub mod lpc;
pub mod resample;
pub mod smoothing;
pub mod window;

pub use error::*;
pub use fft::{Spectrogram, istft, stft};
pub use frame::fetch_frame;
pub use resample::resample;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
