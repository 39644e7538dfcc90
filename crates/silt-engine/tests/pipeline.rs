//! End-to-end pipeline tests
//!
//! Exercise the executor the way the CLI drives it: decode WAV bytes, run a
//! chain, and inspect the written profile or the processed waveform.

use std::io::Cursor;
use std::path::PathBuf;

use silt_engine::{ChainOutcome, Executor, Operation, Waveform, wav};

const RATE: u32 = 44100;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("silt-pipeline-{}-{name}", std::process::id()))
}

/// Deterministic uniform noise in [-amp, amp]
fn lcg_noise(len: usize, amp: f64, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0) * amp
        })
        .collect()
}

fn wav_bytes(samples: Vec<f64>, rate: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    wav::write_wav(&mut bytes, &Waveform::new(samples, rate)).unwrap();
    bytes
}

fn energy(x: &[f64]) -> f64 {
    x.iter().map(|s| s * s).sum()
}

/// Magnitude of the projection onto a complex exponential at `freq`
fn tone_magnitude(x: &[f64], freq: f64, rate: f64) -> f64 {
    let mut re = 0.0;
    let mut im = 0.0;
    for (n, &s) in x.iter().enumerate() {
        let phase = 2.0 * std::f64::consts::PI * freq * n as f64 / rate;
        re += s * phase.cos();
        im += s * phase.sin();
    }
    (re * re + im * im).sqrt()
}

#[test]
fn test_noise_profile_roundtrip_denoises_the_recording() {
    let len = RATE as usize;
    let profile_path = temp_path("roundtrip.prof");

    // Pass 1: profile a noise-only take.
    let noise = lcg_noise(len, 0.01, 42);
    let mut exec = Executor::load(Cursor::new(wav_bytes(noise.clone(), RATE))).unwrap();
    let outcome = exec
        .run(
            &[Operation::AnalyzeNoise {
                path: profile_path.clone(),
                interval: None,
            }],
            &mut Vec::<u8>::new(),
        )
        .unwrap();
    assert_eq!(outcome, ChainOutcome::ProfileWritten);

    // Pass 2: denoise a tone buried in the same noise.
    let mixed: Vec<f64> = (0..len)
        .map(|i| {
            (2.0 * std::f64::consts::PI * 1000.0 * i as f64 / RATE as f64).sin() * 0.1 + noise[i]
        })
        .collect();
    let mut exec = Executor::load(Cursor::new(wav_bytes(mixed, RATE))).unwrap();
    let before = exec.waveform().samples.clone();
    let outcome = exec
        .run(
            &[Operation::Denoise {
                path: profile_path.clone(),
                rate: 1.0,
                bandwidth: 500.0,
                interval: None,
            }],
            &mut Vec::<u8>::new(),
        )
        .unwrap();
    assert_eq!(outcome, ChainOutcome::Completed);

    let after = exec.into_waveform();
    let span = 4096..36864;
    assert!(
        energy(&after.samples[span.clone()]) < energy(&before[span.clone()]),
        "denoising must not add energy"
    );

    // The tone survives within 1 dB.
    let mag_before = tone_magnitude(&before[span.clone()], 1000.0, RATE as f64);
    let mag_after = tone_magnitude(&after.samples[span], 1000.0, RATE as f64);
    let change_db = 20.0 * (mag_after / mag_before).log10();
    assert!(change_db.abs() < 1.0, "tone changed by {change_db} dB");

    std::fs::remove_file(&profile_path).ok();
}

#[test]
fn test_denoise_rejects_profile_from_other_rate() {
    let profile_path = temp_path("rate-mismatch.prof");

    let mut exec =
        Executor::load(Cursor::new(wav_bytes(lcg_noise(48000, 0.01, 7), 48000))).unwrap();
    exec.run(
        &[Operation::AnalyzeNoise {
            path: profile_path.clone(),
            interval: None,
        }],
        &mut Vec::<u8>::new(),
    )
    .unwrap();

    // Same bin count (both rates land on a 256-sample hop), different rate.
    let mut exec = Executor::load(Cursor::new(wav_bytes(lcg_noise(44100, 0.01, 9), 44100))).unwrap();
    let result = exec.run(
        &[Operation::Denoise {
            path: profile_path.clone(),
            rate: 1.0,
            bandwidth: 500.0,
            interval: None,
        }],
        &mut Vec::<u8>::new(),
    );
    assert!(result.is_err());

    std::fs::remove_file(&profile_path).ok();
}

#[test]
fn test_compress_then_normalize_chain_writes_wav() {
    let rate = 48000u32;
    let mut exec = Executor::load(Cursor::new(wav_bytes(vec![0.9; 48000], rate))).unwrap();

    let ops = [
        Operation::Compress {
            threshold: 0.5,
            damping: 0.0,
            loudness: false,
            interval: None,
        },
        Operation::Normalize {
            target: 0.25,
            loudness: false,
        },
    ];
    let outcome = exec.run(&ops, &mut Vec::<u8>::new()).unwrap();
    assert_eq!(outcome, ChainOutcome::Completed);

    let mut bytes = Vec::new();
    wav::write_wav(&mut bytes, exec.waveform()).unwrap();
    let reread = wav::read_wav(Cursor::new(bytes)).unwrap();

    assert_eq!(reread.sample_rate, rate);
    assert_eq!(reread.bits_per_sample, 16);
    assert!((reread.peak() - 0.25).abs() < 1e-3);
}

#[test]
fn test_measure_and_detect_reports_compose() {
    let rate = 48000u32;
    let samples: Vec<f64> = (0..rate as usize)
        .map(|i| {
            if i < 24000 {
                0.0
            } else {
                (2.0 * std::f64::consts::PI * 440.0 * i as f64 / rate as f64).sin() * 0.8
            }
        })
        .collect();
    let mut exec = Executor::load(Cursor::new(wav_bytes(samples, rate))).unwrap();

    let mut report = Vec::new();
    let ops = [
        Operation::MeasureLoudness { interval: None },
        Operation::DetectThreshold { threshold: 0.5 },
    ];
    exec.run(&ops, &mut report).unwrap();

    let text = String::from_utf8(report).unwrap();
    assert!(text.starts_with("Total = "));
    assert!(text.contains(" LKFS"));
    // The threshold report follows the loudness lines and points into the
    // second half of the buffer.
    let last = text.lines().last().unwrap();
    assert!(last.contains('\t'));
    let begin: f64 = last.split('\t').next().unwrap().parse().unwrap();
    assert!(begin >= 0.5);
}
