//! K-weighted loudness measurement
//!
//! ITU-R BS.1770-style integrated loudness with absolute and relative
//! gating. The signal is resampled to 48 kHz, run through the two-stage
//! K-weighting filter, and measured over blocks of four strides with a
//! two-block leading offset. The same offset is assumed by the
//! loudness-gated compressor when it maps frames onto blocks.

use silt_dsp::filter::filter;
use silt_dsp::{fetch_frame, resample};

use crate::error::EngineResult;

/// Reference rate all loudness measurement runs at
pub const LOUDNESS_RATE: u32 = 48000;

/// K-weighting stage 1: shelving pre-filter
pub const PRE_FILTER_B: [f64; 3] = [1.53512485958697, -2.69169618940638, 1.19839281085285];
pub const PRE_FILTER_A: [f64; 3] = [1.0, -1.69065929318241, 0.73248077421585];

/// K-weighting stage 2: revised low-frequency B-curve highpass
pub const RLB_FILTER_B: [f64; 3] = [1.0, -2.0, 1.0];
pub const RLB_FILTER_A: [f64; 3] = [1.0, -1.99004745483398, 0.99007225036621];

/// Absolute gate and silence floor in LKFS
pub const ABSOLUTE_GATE: f64 = -70.0;

/// Result of a loudness measurement
#[derive(Debug, Clone)]
pub struct LoudnessMeasurement {
    /// Gated integrated loudness in LKFS (>= -70, exactly -70 for silence)
    pub integrated: f64,
    /// Instantaneous loudness per block in LKFS
    pub instantaneous: Vec<f64>,
    /// Block stride in samples at 48 kHz
    pub stride_48k: usize,
}

impl LoudnessMeasurement {
    /// Center time of block `i` in seconds
    pub fn block_time(&self, i: usize) -> f64 {
        (i + 2) as f64 * self.stride_48k as f64 / LOUDNESS_RATE as f64
    }
}

/// Measure `samples` at `sample_rate` with a block stride of `hop` samples.
pub fn measure(samples: &[f64], sample_rate: u32, hop: usize) -> EngineResult<LoudnessMeasurement> {
    let x48 = resample(samples, sample_rate, LOUDNESS_RATE)?;
    let stride = (hop as u64 * LOUDNESS_RATE as u64 / sample_rate.max(1) as u64).max(1) as usize;

    let stage1 = filter(&PRE_FILTER_B, &PRE_FILTER_A, &x48);
    let weighted = filter(&RLB_FILTER_B, &RLB_FILTER_A, &stage1);

    let block_len = stride * 4;
    let blocks = ((weighted.len() as i64 - block_len as i64) / stride as i64).max(1) as usize;

    let mut power = Vec::with_capacity(blocks);
    let mut instantaneous = Vec::with_capacity(blocks);
    for i in 0..blocks {
        let center = ((i + 2) * stride) as isize;
        let block = fetch_frame(&weighted, center, block_len);
        let z = block.iter().map(|s| s * s).sum::<f64>() / block_len as f64;
        power.push(z);
        instantaneous.push(-0.691 + 10.0 * z.log10());
    }

    Ok(LoudnessMeasurement {
        integrated: gated_loudness(&power, &instantaneous),
        instantaneous,
        stride_48k: stride,
    })
}

/// Two-pass gated mean: absolute gate at -70 LKFS sets the relative
/// threshold 10 LU below the ungated loudness; blocks above it form the
/// integrated value.
fn gated_loudness(power: &[f64], instantaneous: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (z, l) in power.iter().zip(instantaneous) {
        if *l > ABSOLUTE_GATE {
            sum += z;
            count += 1;
        }
    }
    if count == 0 {
        return ABSOLUTE_GATE;
    }
    let threshold = -0.691 + 10.0 * (sum / count as f64).log10() - 10.0;

    sum = 0.0;
    count = 0;
    for (z, l) in power.iter().zip(instantaneous) {
        if *l > threshold {
            sum += z;
            count += 1;
        }
    }
    if count == 0 {
        return ABSOLUTE_GATE;
    }
    -0.691 + 10.0 * (sum / count as f64).log10()
}
