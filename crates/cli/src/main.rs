use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use facetrack_ptz_core::error::TrackerError;
use facetrack_ptz_core::session::tick::{TickCommand, TickInput};
use facetrack_ptz_core::session::tracker_config::TrackerConfig;
use facetrack_ptz_core::session::tracker_session::TrackerSession;
use facetrack_ptz_core::shared::axes::{Axes, Vec3};
use facetrack_ptz_core::telemetry::infrastructure::json_lines_sink::JsonLinesTelemetrySink;
use facetrack_ptz_core::transport::infrastructure::json_lines_transport::JsonLinesTransport;

/// Replay a face detection trace through the PTZ controller.
///
/// The trace is JSON lines of `{"t_ms": 0, "found": true, "error": [x, y, z]}`.
/// Transport calls are written to stdout, one JSON object per line.
#[derive(Parser)]
#[command(name = "facetrack-ptz")]
struct Cli {
    /// Detection trace file, or `-` for stdin.
    trace: PathBuf,

    /// JSON file with a base configuration (read only).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Proportional gain per axis (x,y,z).
    #[arg(long, value_delimiter = ',')]
    kp: Option<Vec<f64>>,

    /// Integral gain per axis (x,y,z).
    #[arg(long, value_delimiter = ',')]
    ki: Option<Vec<f64>>,

    /// Error low-pass coefficient per axis, in (0, 1].
    #[arg(long, value_delimiter = ',')]
    klpf: Option<Vec<f64>>,

    /// Integral low-pass coefficient per axis, in (0, 1].
    #[arg(long, value_delimiter = ',')]
    tlpf: Option<Vec<f64>>,

    /// Error deadband per axis.
    #[arg(long, value_delimiter = ',')]
    deadband: Option<Vec<f64>>,

    /// Width of the soft knee above the deadband, per axis.
    #[arg(long, value_delimiter = ',')]
    nonlinear: Option<Vec<f64>>,

    /// Framing target subtracted from the detector error (x,y,z).
    #[arg(long, value_delimiter = ',')]
    target: Option<Vec<f64>>,

    /// Effort at which each axis saturates (x,y,z).
    #[arg(long, value_delimiter = ',')]
    effort_limit: Option<Vec<f64>>,

    /// Largest step command per axis (x,y,z).
    #[arg(long, value_delimiter = ',')]
    step_max: Option<Vec<i32>>,

    /// Timestep assumed for the first tick, in milliseconds.
    #[arg(long)]
    nominal_tick_ms: Option<u64>,

    /// Milliseconds without a face before the lost preset is recalled.
    #[arg(long)]
    preset_timeout_ms: Option<u64>,

    /// Milliseconds without a face before zooming out.
    #[arg(long)]
    zoomout_timeout_ms: Option<u64>,

    /// Preset recalled when the face is lost.
    #[arg(long)]
    lost_preset: Option<u32>,

    /// Write per-tick telemetry as JSON lines to this file.
    #[arg(long)]
    telemetry: Option<PathBuf>,

    /// Also print move commands whose steps are all zero.
    #[arg(long)]
    include_holds: bool,
}

/// One line of a detection trace.
#[derive(Debug, Deserialize, PartialEq)]
struct TraceLine {
    t_ms: u64,
    found: bool,
    #[serde(default)]
    error: Vec3,
}

impl From<TraceLine> for TickInput {
    fn from(line: TraceLine) -> Self {
        TickInput {
            timestamp: Duration::from_millis(line.t_ms),
            found: line.found,
            error: line.error,
        }
    }
}

#[derive(Debug, Default)]
struct ReplaySummary {
    ticks: usize,
    moves: usize,
    recoveries: usize,
    rejected: usize,
    transport_errors: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let mut session = TrackerSession::new(config)?;
    if let Some(path) = &cli.telemetry {
        session = session.with_telemetry(Box::new(JsonLinesTelemetrySink::create(path)?));
    }
    let mut transport = JsonLinesTransport::new(io::stdout()).with_holds(cli.include_holds);

    let reader = open_trace(&cli.trace)?;
    let mut summary = ReplaySummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let input: TickInput = parse_trace_line(&line)
            .map_err(|e| format!("trace line {}: {e}", index + 1))?
            .into();

        match session.tick_and_send(&input, &mut transport) {
            Ok(report) => {
                summary.ticks += 1;
                match report.command {
                    Some(TickCommand::Move(_)) => summary.moves += 1,
                    Some(TickCommand::Recovery(_)) => summary.recoveries += 1,
                    None => {}
                }
                if report.transport_error.is_some() {
                    summary.transport_errors += 1;
                }
            }
            Err(e @ TrackerError::InvalidTimestep { .. }) => {
                log::warn!("Skipping trace line {}: {e}", index + 1);
                summary.rejected += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    session.flush_telemetry()?;

    log::info!(
        "Replayed {} ticks: {} moves, {} recovery commands, {} rejected, {} transport errors",
        summary.ticks,
        summary.moves,
        summary.recoveries,
        summary.rejected,
        summary.transport_errors
    );
    Ok(())
}

fn build_config(cli: &Cli) -> Result<TrackerConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
            serde_json::from_str(&json)
                .map_err(|e| format!("Invalid config {}: {e}", path.display()))?
        }
        None => TrackerConfig::default(),
    };

    let overrides = [
        (&cli.kp, &mut config.kp),
        (&cli.ki, &mut config.ki),
        (&cli.klpf, &mut config.klpf),
        (&cli.tlpf, &mut config.tlpf),
        (&cli.deadband, &mut config.deadband),
        (&cli.nonlinear, &mut config.nonlinear),
        (&cli.target, &mut config.target),
        (&cli.effort_limit, &mut config.effort_limit),
    ];
    for (value, field) in overrides {
        if let Some(v) = value {
            *field = to_vec3(v)?;
        }
    }
    if let Some(v) = &cli.step_max {
        config.step_max = to_axes(v)?;
    }
    if let Some(ms) = cli.nominal_tick_ms {
        config.nominal_tick = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.preset_timeout_ms {
        config.preset_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.zoomout_timeout_ms {
        config.zoomout_timeout = Duration::from_millis(ms);
    }
    if let Some(preset) = cli.lost_preset {
        config.lost_preset = Some(preset);
    }

    config.validate()?;
    Ok(config)
}

fn to_vec3(values: &[f64]) -> Result<Vec3, Box<dyn std::error::Error>> {
    to_axes(values)
}

fn to_axes<T: Copy>(values: &[T]) -> Result<Axes<T>, Box<dyn std::error::Error>> {
    match values {
        [x, y, z] => Ok(Axes::new(*x, *y, *z)),
        _ => Err(format!("Expected 3 comma-separated values, got {}", values.len()).into()),
    }
}

fn parse_trace_line(line: &str) -> Result<TraceLine, serde_json::Error> {
    serde_json::from_str(line)
}

fn open_trace(path: &Path) -> Result<Box<dyn BufRead>, Box<dyn std::error::Error>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = fs::File::open(path)
        .map_err(|e| format!("Cannot open trace {}: {e}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}
