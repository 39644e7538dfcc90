//! Amplitude threshold segmentation
//!
//! Single pass over the buffer reporting the time intervals where the
//! absolute sample value stays at or above the threshold. A region still
//! open at the end of the buffer is not reported.

use std::fmt::Write as _;

/// A closed time interval in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub begin: f64,
    pub end: f64,
}

/// Find all intervals of `samples` with `|s| >= threshold`.
pub fn detect(samples: &[f64], sample_rate: u32, threshold: f64) -> Vec<Interval> {
    let fs = sample_rate as f64;
    let mut intervals = Vec::new();
    let mut begin: Option<usize> = None;

    for (i, &s) in samples.iter().enumerate() {
        match begin {
            None if s.abs() >= threshold => begin = Some(i),
            Some(b) if s.abs() < threshold => {
                intervals.push(Interval {
                    begin: b as f64 / fs,
                    end: (i - 1) as f64 / fs,
                });
                begin = None;
            }
            _ => {}
        }
    }
    intervals
}

/// Render intervals as one `begin TAB end` line each, in seconds.
pub fn format_report(intervals: &[Interval]) -> String {
    let mut out = String::new();
    for iv in intervals {
        let _ = writeln!(out, "{:.6}\t{:.6}", iv.begin, iv.end);
    }
    out
}
