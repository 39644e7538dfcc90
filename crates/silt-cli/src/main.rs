//! silt: offline audio cleanup pipeline
//!
//! Operation flags are appended to the processing chain in the order they
//! appear on the command line; the global parameters `-r`, `-s` and `-i`
//! apply to the stages that follow them. Missing positional paths default
//! to stdin/stdout, and a trailing lone `-n` suppresses the output write.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use silt_engine::{ChainOutcome, Executor, Operation, wav};

/// Upper bound on the chain length
const MAX_OPERATIONS: usize = 128;

fn cli() -> Command {
    Command::new("silt")
        .about("Offline audio cleanup: denoising, loudness, dynamics, inverse filtering")
        .disable_help_flag(true)
        .arg(
            Arg::new("analyze")
                .short('a')
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Append noise-profile analysis; write the profile to FILE"),
        )
        .arg(
            Arg::new("denoise")
                .short('d')
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Append spectral subtraction; read the profile from FILE"),
        )
        .arg(
            Arg::new("rate")
                .short('r')
                .value_name("RATE")
                .action(ArgAction::Append)
                .help("Set the denoise rate for subsequent stages [default: 1.0]"),
        )
        .arg(
            Arg::new("bandwidth")
                .short('s')
                .value_name("HZ")
                .action(ArgAction::Append)
                .help("Set the gain smoothing bandwidth for subsequent stages [default: 500]"),
        )
        .arg(
            Arg::new("compress")
                .short('c')
                .value_name("THR,DAMP[,k]")
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .help("Append a compressor; with a trailing ,k the threshold is in LKFS"),
        )
        .arg(
            Arg::new("normalize")
                .short('n')
                .value_name("MAX[,k]")
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .help("Append a normalizer; with a trailing ,k the target is in LKFS"),
        )
        .arg(
            Arg::new("inverse")
                .short('I')
                .value_name("ORDER,WINDOW")
                .action(ArgAction::Append)
                .help("Append an LPC inverse filter (prediction order, window in seconds)"),
        )
        .arg(
            Arg::new("loudness")
                .short('l')
                .action(ArgAction::Append)
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("")
                .help("Append a loudness measurement (prints to stdout)"),
        )
        .arg(
            Arg::new("threshold")
                .short('t')
                .value_name("THRESHOLD")
                .action(ArgAction::Append)
                .help("Append an amplitude threshold report (prints to stdout)"),
        )
        .arg(
            Arg::new("interval")
                .short('i')
                .value_name("SECONDS")
                .action(ArgAction::Append)
                .help("Override the processing interval for subsequent stages"),
        )
        .arg(
            Arg::new("help")
                .short('h')
                .action(ArgAction::SetTrue)
                .help("Print usage and exit"),
        )
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .help("Input WAV file (stdin when omitted)"),
        )
        .arg(
            Arg::new("output")
                .value_name("OUTPUT")
                .help("Output WAV file (stdout when omitted; a trailing lone -n suppresses writing)"),
        )
}

/// A fully parsed command line
#[derive(Debug)]
struct Invocation {
    operations: Vec<Operation>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    suppress_output: bool,
    show_help: bool,
}

/// Remove a trailing lone `-n` (the "no output" sentinel). `-n` followed by
/// a value is the normalizer flag and is left alone.
fn strip_output_sentinel(argv: &mut Vec<String>) -> bool {
    if argv.len() > 1 && argv.last().map(String::as_str) == Some("-n") {
        argv.pop();
        true
    } else {
        false
    }
}

/// Flag occurrences flattened back into command-line order
fn collect_events(matches: &ArgMatches) -> Vec<(usize, &'static str, String)> {
    let ids = [
        "analyze",
        "denoise",
        "rate",
        "bandwidth",
        "compress",
        "normalize",
        "inverse",
        "loudness",
        "threshold",
        "interval",
    ];

    let mut events = Vec::new();
    for id in ids {
        let Some(indices) = matches.indices_of(id) else {
            continue;
        };
        let values: Vec<String> = matches
            .get_many::<String>(id)
            .map(|v| v.cloned().collect())
            .unwrap_or_default();
        for (idx, value) in indices.zip(values) {
            events.push((idx, id, value));
        }
    }
    events.sort_by_key(|(idx, _, _)| *idx);
    events
}

fn parse_float(flag: &str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| anyhow!("{flag} option requires a numeric argument, got \"{value}\""))
}

/// Split `value` at commas into `expected` numeric fields plus an optional
/// trailing `k` marker.
fn parse_fields(flag: &str, value: &str, expected: usize) -> Result<(Vec<f64>, bool)> {
    let parts: Vec<&str> = value.split(',').collect();
    let loudness = parts.len() == expected + 1 && parts[expected] == "k";
    if parts.len() != expected && !loudness {
        bail!("{flag} option requires {expected} comma-separated parameters");
    }
    let mut fields = Vec::with_capacity(expected);
    for part in &parts[..expected] {
        fields.push(parse_float(flag, part)?);
    }
    Ok((fields, loudness))
}

/// Fold ordered flag events into the operation chain, snapshotting the
/// global parameters in force as each operation is appended.
fn build_chain(events: &[(usize, &'static str, String)]) -> Result<Vec<Operation>> {
    let mut rate = 1.0f64;
    let mut bandwidth = 500.0f64;
    let mut interval: Option<f64> = None;
    let mut operations = Vec::new();

    for (_, id, value) in events {
        match *id {
            "rate" => rate = parse_float("-r", value)?,
            "bandwidth" => bandwidth = parse_float("-s", value)?,
            "interval" => interval = Some(parse_float("-i", value)?),
            "analyze" => operations.push(Operation::AnalyzeNoise {
                path: PathBuf::from(value),
                interval,
            }),
            "denoise" => operations.push(Operation::Denoise {
                path: PathBuf::from(value),
                rate,
                bandwidth,
                interval,
            }),
            "compress" => {
                let (fields, loudness) = parse_fields("-c", value, 2)?;
                operations.push(Operation::Compress {
                    threshold: fields[0],
                    damping: fields[1],
                    loudness,
                    interval,
                });
            }
            "normalize" => {
                let (fields, loudness) = parse_fields("-n", value, 1)?;
                operations.push(Operation::Normalize {
                    target: fields[0],
                    loudness,
                });
            }
            "inverse" => {
                let (fields, _) = parse_fields("-I", value, 2)?;
                if fields[0] < 1.0 || fields[0].fract() != 0.0 {
                    bail!("-I option requires a positive integer order");
                }
                operations.push(Operation::InverseFilter {
                    order: fields[0] as usize,
                    window_sec: fields[1],
                    interval,
                });
            }
            "loudness" => operations.push(Operation::MeasureLoudness { interval }),
            "threshold" => operations.push(Operation::DetectThreshold {
                threshold: parse_float("-t", value)?,
            }),
            _ => {}
        }
    }

    if operations.len() > MAX_OPERATIONS {
        bail!("too many operations (limit {MAX_OPERATIONS})");
    }
    Ok(operations)
}

fn parse_invocation<I, T>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut argv: Vec<String> = args.into_iter().map(Into::into).collect();
    let suppress_output = strip_output_sentinel(&mut argv);

    let matches = cli().try_get_matches_from(&argv).map_err(|e| {
        let text = e.to_string();
        anyhow!("{}", text.lines().next().unwrap_or("invalid arguments").to_string())
    })?;

    let operations = build_chain(&collect_events(&matches))?;
    Ok(Invocation {
        operations,
        input: matches.get_one::<String>("input").map(PathBuf::from),
        output: matches.get_one::<String>("output").map(PathBuf::from),
        suppress_output,
        show_help: matches.get_flag("help"),
    })
}

/// Check profile paths up front so a bad path fails before any processing,
/// and so `-a` truncates its target at the same point the chain is set up.
fn preflight_profiles(operations: &[Operation]) -> Result<()> {
    for op in operations {
        match op {
            Operation::AnalyzeNoise { path, .. } => {
                File::create(path)
                    .with_context(|| format!("Cannot write to {}.", path.display()))?;
            }
            Operation::Denoise { path, .. } => {
                File::open(path).with_context(|| format!("Cannot open {}.", path.display()))?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn run() -> Result<i32> {
    let invocation = parse_invocation(std::env::args())?;
    if invocation.show_help {
        eprint!("{}", cli().render_help());
        return Ok(1);
    }
    log::debug!("chain holds {} operations", invocation.operations.len());
    preflight_profiles(&invocation.operations)?;

    let mut executor = match &invocation.input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Cannot open {}.", path.display()))?;
            Executor::load(BufReader::new(file))?
        }
        None => Executor::load(io::stdin().lock())?,
    };

    let outcome = executor.run(&invocation.operations, &mut io::stdout().lock())?;

    if outcome == ChainOutcome::Completed && !invocation.suppress_output {
        let wave = executor.into_waveform();
        match &invocation.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Cannot write to {}.", path.display()))?;
                wav::write_wav(BufWriter::new(file), &wave)?;
            }
            None => wav::write_wav(io::stdout().lock(), &wave)?,
        }
    }
    Ok(0)
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
