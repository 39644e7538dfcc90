//! Operation-chain execution
//!
//! The executor owns the working buffer and runs the chain in order. Each
//! operation resolves its frame geometry from the current sample rate and
//! its snapshotted parameters, then either replaces the buffer, mutates it
//! in place, or emits a text report. Noise-profile analysis short-circuits
//! the chain; a failing stage aborts the run.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use crate::analyze::analyze;
use crate::buffer::Waveform;
use crate::compress::{CompressorParams, compress};
use crate::denoise::{DenoiseParams, denoise};
use crate::error::{EngineError, EngineResult};
use crate::geometry::{FrameGeometry, LOUDNESS_INTERVAL, PEAK_COMPRESS_INTERVAL};
use crate::loudness;
use crate::normalize::{normalize_loudness, normalize_peak};
use crate::profile::NoiseProfile;
use crate::residual::{InverseFilterParams, inverse_filter};
use crate::threshold;
use crate::wav;

/// One entry of the processing chain.
///
/// Global parameters (denoise rate, smoothing bandwidth, processing
/// interval) are captured at the point the operation is appended, so later
/// changes only affect subsequent stages.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Analyze a noise profile and write it to `path`; terminates the chain.
    AnalyzeNoise {
        path: PathBuf,
        interval: Option<f64>,
    },
    /// Spectral subtraction against the profile stored at `path`.
    Denoise {
        path: PathBuf,
        rate: f64,
        bandwidth: f64,
        interval: Option<f64>,
    },
    /// Downward compression, peak-driven or loudness-driven.
    Compress {
        threshold: f64,
        damping: f64,
        loudness: bool,
        interval: Option<f64>,
    },
    /// Global gain to an absolute peak or integrated loudness target.
    Normalize { target: f64, loudness: bool },
    /// LPC inverse filtering.
    InverseFilter {
        order: usize,
        window_sec: f64,
        interval: Option<f64>,
    },
    /// Loudness measurement report.
    MeasureLoudness { interval: Option<f64> },
    /// Amplitude threshold-crossing report.
    DetectThreshold { threshold: f64 },
}

/// How the chain finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// All operations ran; the buffer is ready for the output sink.
    Completed,
    /// Noise analysis wrote its profile; no waveform should be written.
    ProfileWritten,
}

/// Owner of the working buffer for the lifetime of a run
pub struct Executor {
    waveform: Waveform,
}

impl Executor {
    /// Take ownership of an already-decoded waveform.
    pub fn new(waveform: Waveform) -> Self {
        Self { waveform }
    }

    /// Decode a WAV stream into a fresh executor.
    pub fn load<R: Read>(input: R) -> EngineResult<Self> {
        Ok(Self::new(wav::read_wav(input)?))
    }

    /// The current working buffer
    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    /// Give up the working buffer after the chain has run.
    pub fn into_waveform(self) -> Waveform {
        self.waveform
    }

    /// Run the chain in order, writing text reports to `report`.
    pub fn run<W: Write>(
        &mut self,
        operations: &[Operation],
        report: &mut W,
    ) -> EngineResult<ChainOutcome> {
        for op in operations {
            log::debug!("running {op:?} on {} samples", self.waveform.len());
            match op {
                Operation::AnalyzeNoise { path, interval } => {
                    let geo = FrameGeometry::stft(self.waveform.sample_rate, *interval);
                    let profile = analyze(&self.waveform, &geo);
                    let file = File::create(path).map_err(|e| {
                        EngineError::OutputWrite(format!("{}: {e}", path.display()))
                    })?;
                    let mut writer = BufWriter::new(file);
                    profile.write_to(&mut writer)?;
                    writer.flush()?;
                    log::info!("noise profile written to {}", path.display());
                    return Ok(ChainOutcome::ProfileWritten);
                }
                Operation::Denoise {
                    path,
                    rate,
                    bandwidth,
                    interval,
                } => {
                    let geo = FrameGeometry::stft(self.waveform.sample_rate, *interval);
                    let file = File::open(path).map_err(|e| {
                        EngineError::InputRead(format!("{}: {e}", path.display()))
                    })?;
                    let profile = NoiseProfile::read_from(
                        &mut BufReader::new(file),
                        geo.bins(),
                        self.waveform.sample_rate,
                    )?;
                    let params = DenoiseParams {
                        rate: *rate,
                        bandwidth: *bandwidth,
                    };
                    let cleaned = denoise(&self.waveform, &profile, &params, &geo)?;
                    self.waveform.replace_samples(cleaned);
                }
                Operation::Compress {
                    threshold,
                    damping,
                    loudness,
                    interval,
                } => {
                    let default = if *loudness {
                        LOUDNESS_INTERVAL
                    } else {
                        PEAK_COMPRESS_INTERVAL
                    };
                    let geo =
                        FrameGeometry::time_domain(self.waveform.sample_rate, default, *interval);
                    let params = CompressorParams {
                        threshold: *threshold,
                        damping: *damping,
                        loudness: *loudness,
                    };
                    compress(&mut self.waveform, &params, geo.hop)?;
                }
                Operation::Normalize { target, loudness } => {
                    if *loudness {
                        normalize_loudness(&mut self.waveform, *target)?;
                    } else {
                        normalize_peak(&mut self.waveform, *target);
                    }
                }
                Operation::InverseFilter {
                    order,
                    window_sec,
                    interval,
                } => {
                    let geo = FrameGeometry::time_domain(
                        self.waveform.sample_rate,
                        window_sec / 4.0,
                        *interval,
                    );
                    let params = InverseFilterParams {
                        order: *order,
                        window_sec: *window_sec,
                    };
                    let residual = inverse_filter(&self.waveform, &params, geo.hop)?;
                    self.waveform.replace_samples(residual);
                }
                Operation::MeasureLoudness { interval } => {
                    let geo = FrameGeometry::time_domain(
                        self.waveform.sample_rate,
                        LOUDNESS_INTERVAL,
                        *interval,
                    );
                    let m = loudness::measure(
                        &self.waveform.samples,
                        self.waveform.sample_rate,
                        geo.hop,
                    )?;
                    writeln!(report, "Total = {:.6} LKFS", m.integrated)?;
                    for (i, l) in m.instantaneous.iter().enumerate() {
                        writeln!(report, "{:.6}, {:.6} LKFS", m.block_time(i), l)?;
                    }
                }
                Operation::DetectThreshold { threshold: t } => {
                    let intervals =
                        threshold::detect(&self.waveform.samples, self.waveform.sample_rate, *t);
                    report.write_all(threshold::format_report(&intervals).as_bytes())?;
                }
            }
        }
        Ok(ChainOutcome::Completed)
    }
}
