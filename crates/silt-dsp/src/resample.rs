//! Offline sample rate conversion

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::{DspError, DspResult};

/// Resample `x` from `from_rate` to `to_rate` with a windowed-sinc kernel.
///
/// The whole buffer is converted in one pass; equal rates return the input
/// unchanged.
pub fn resample(x: &[f64], from_rate: u32, to_rate: u32) -> DspResult<Vec<f64>> {
    if from_rate == to_rate || x.is_empty() {
        return Ok(x.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f64>::new(ratio, 2.0, params, x.len(), 1)
        .map_err(|e| DspError::Resample(e.to_string()))?;
    let output = resampler
        .process(&[x], None)
        .map_err(|e| DspError::Resample(e.to_string()))?;

    Ok(output.into_iter().next().unwrap_or_default())
}
