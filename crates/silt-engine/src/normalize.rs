//! Peak and loudness normalization

use crate::buffer::Waveform;
use crate::error::EngineResult;
use crate::geometry::{FrameGeometry, LOUDNESS_INTERVAL};
use crate::loudness;

/// Scale the buffer so its absolute peak equals `target`.
///
/// An all-zero buffer is left unchanged.
pub fn normalize_peak(wave: &mut Waveform, target: f64) {
    let peak = wave.peak();
    if peak > 0.0 {
        wave.apply_gain(target / peak);
    }
}

/// Scale the buffer so its integrated loudness equals `target` LKFS,
/// measured at the standard 0.1 s block stride.
pub fn normalize_loudness(wave: &mut Waveform, target: f64) -> EngineResult<()> {
    let hop = FrameGeometry::time_domain(wave.sample_rate, LOUDNESS_INTERVAL, None).hop;
    let measured = loudness::measure(&wave.samples, wave.sample_rate, hop)?.integrated;
    wave.apply_gain(10f64.powf((target - measured) / 20.0));
    Ok(())
}
