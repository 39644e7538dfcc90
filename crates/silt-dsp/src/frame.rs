//! Centered frame extraction

/// Extract `size` samples centered at `center`, zero-padded outside `x`.
///
/// Sample `j` of the result maps to `x[center - size / 2 + j]`.
pub fn fetch_frame(x: &[f64], center: isize, size: usize) -> Vec<f64> {
    let half = (size / 2) as isize;
    (0..size as isize)
        .map(|j| {
            let idx = center - half + j;
            if idx >= 0 && (idx as usize) < x.len() {
                x[idx as usize]
            } else {
                0.0
            }
        })
        .collect()
}
