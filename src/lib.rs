use std::{
    fmt::Display,
    path::PathBuf,
    time::{Duration, Instant},
};

use clap::{value_parser, Arg, ArgMatches, Command};
use log::{info, LevelFilter};

pub mod core;
pub mod error;
pub mod pipeline;

pub use crate::core::{AnimationClock, Color, PixelFormat, PixelSurface, Rounding, WaveParameters};
pub use error::{CaptureError, RenderError, SurfaceError, WarpError};
pub use pipeline::{FrameOutcome, RenderSession};

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Screen,
    Pattern,
}

/// Frame counters and timings, logged once a second.
pub struct Metrics {
    pub last_report: Instant,
    pub rendered: u64,
    pub skipped: u64,
    pub dropped: u64,
    pub fps_counter: u32,
    pub current_fps: f32,
    pub frame_times: Vec<f32>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    const WINDOW: usize = 120;

    pub fn new() -> Self {
        Self {
            last_report: Instant::now(),
            rendered: 0,
            skipped: 0,
            dropped: 0,
            fps_counter: 0,
            current_fps: 0.0,
            frame_times: Vec::with_capacity(Self::WINDOW),
        }
    }

    pub fn record(&mut self, outcome: FrameOutcome, frame_time: Duration) {
        match outcome {
            FrameOutcome::Rendered => {
                self.rendered += 1;
                self.fps_counter += 1;
            }
            FrameOutcome::Skipped => self.skipped += 1,
            FrameOutcome::Dropped => self.dropped += 1,
        }
        if self.frame_times.len() == Self::WINDOW {
            self.frame_times.remove(0);
        }
        self.frame_times.push(frame_time.as_secs_f32() * 1000.0);
    }

    pub fn average_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            0.0
        } else {
            self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32
        }
    }

    /// Log the frame rate if a second has passed since the last report.
    pub fn maybe_report(&mut self) {
        let elapsed = self.last_report.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.current_fps = self.fps_counter as f32 / elapsed.as_secs_f32();
            self.fps_counter = 0;
            self.last_report = Instant::now();
            info!("{}", self);
        }
    }
}

impl Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FPS: {:.2} | Avg: {:.2}ms | Min: {:.2}ms | Max: {:.2}ms | Skipped: {} | Dropped: {}",
            self.current_fps,
            self.average_ms(),
            self.frame_times
                .iter()
                .copied()
                .reduce(f32::min)
                .unwrap_or(0.0),
            self.frame_times
                .iter()
                .copied()
                .reduce(f32::max)
                .unwrap_or(0.0),
            self.skipped,
            self.dropped,
        )
    }
}

/// Everything the binary can be told on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub wave: WaveParameters,
    pub phase: f64,
    pub step: f64,
    pub interval: Duration,
    pub threads: usize,
    pub source: SourceKind,
    pub snapshot: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wave: WaveParameters::default(),
            phase: 0.0,
            step: crate::core::clock::DEFAULT_STEP,
            interval: crate::core::clock::DEFAULT_INTERVAL,
            threads: 0,
            source: SourceKind::Screen,
            snapshot: None,
            log_level: LevelFilter::Info,
        }
    }
}

pub fn create_clap_command() -> Command {
    Command::new("wavy_mirror")
        .about("Full screen wavy mirror of the desktop")
        .version("0.1")
        .arg(
            Arg::new("amplitude")
                .short('a')
                .long("amplitude")
                .value_name("PIXELS")
                .help("Maximum displacement of the wave in pixels")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .default_value("20"),
        )
        .arg(
            Arg::new("frequency")
                .short('f')
                .long("frequency")
                .value_name("RAD_PER_PIXEL")
                .help("Spatial frequency of the wave")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .default_value("0.05"),
        )
        .arg(
            Arg::new("phase")
                .long("phase")
                .value_name("RADIANS")
                .help("Starting phase")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .default_value("0"),
        )
        .arg(
            Arg::new("step")
                .short('s')
                .long("step")
                .value_name("RADIANS")
                .help("Phase added on every tick")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .default_value("0.2"),
        )
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval-ms")
                .value_name("MS")
                .help("Milliseconds between ticks")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("10"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("N")
                .help("Warp worker threads (0 = one per core)")
                .value_parser(value_parser!(usize))
                .default_value("0"),
        )
        .arg(
            Arg::new("rounding")
                .long("rounding")
                .value_name("MODE")
                .help("How wave offsets become whole pixels")
                .value_parser(["nearest", "truncate"])
                .default_value("nearest"),
        )
        .arg(
            Arg::new("source")
                .long("source")
                .value_name("SOURCE")
                .help("Capture the screen, or use a built in test pattern")
                .value_parser(["screen", "pattern"])
                .default_value("screen"),
        )
        .arg(
            Arg::new("snapshot")
                .long("snapshot")
                .value_name("FILE")
                .help("Render a single frame to an image file and exit")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["off", "error", "warn", "info", "debug", "trace"])
                .default_value("info"),
        )
}

pub fn handle_clap_matches(matches: &ArgMatches) -> Settings {
    let defaults = Settings::default();
    let float = |id: &str, fallback: f64| matches.get_one::<f64>(id).copied().unwrap_or(fallback);

    let rounding = match matches.get_one::<String>("rounding").map(String::as_str) {
        Some("truncate") => Rounding::Truncate,
        _ => Rounding::Nearest,
    };
    let source = match matches.get_one::<String>("source").map(String::as_str) {
        Some("pattern") => SourceKind::Pattern,
        _ => SourceKind::Screen,
    };

    Settings {
        wave: WaveParameters::new(
            float("amplitude", defaults.wave.amplitude()),
            float("frequency", defaults.wave.frequency()),
            rounding,
        ),
        phase: float("phase", defaults.phase),
        step: float("step", defaults.step),
        interval: matches
            .get_one::<u64>("interval")
            .map(|&ms| Duration::from_millis(ms))
            .unwrap_or(defaults.interval),
        threads: matches
            .get_one::<usize>("threads")
            .copied()
            .unwrap_or(defaults.threads),
        source,
        snapshot: matches.get_one::<PathBuf>("snapshot").cloned(),
        log_level: matches
            .get_one::<String>("log-level")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.log_level),
    }
}
