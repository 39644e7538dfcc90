//! Analysis windows

/// Periodic Hann window of length `n`.
///
/// The periodic form makes overlap-add weight sums exact: shifted copies at
/// a stride of `n / 4` sum to 2, and at a stride of `n / 2` to 1.
pub fn hann(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}
