use std::path::Path;
use std::sync::Arc;

use log::{error, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use wavy_mirror::{
    core::{AnimationClock, Ticker},
    create_clap_command, handle_clap_matches,
    pipeline::{DisplayHost, OffscreenHost, PatternGrabber, ScreenGrabber, WindowHost, XcapGrabber},
    FrameOutcome, RenderError, RenderSession, Settings, SourceKind,
};

const PATTERN_SIZE: (usize, usize) = (1280, 720);

fn main() -> Result<(), RenderError> {
    let matches = create_clap_command().get_matches();
    let settings = handle_clap_matches(&matches);

    TermLogger::init(
        settings.log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    info!(
        "Wave amplitude {} frequency {} step {} every {:?} ({} rounding)",
        settings.wave.amplitude(),
        settings.wave.frequency(),
        settings.step,
        settings.interval,
        settings.wave.rounding()
    );

    let result = match settings.source {
        SourceKind::Screen => run(XcapGrabber::new(), &settings),
        SourceKind::Pattern => run(PatternGrabber::new(PATTERN_SIZE.0, PATTERN_SIZE.1), &settings),
    };
    if let Err(e) = &result {
        error!("{e}");
    }
    result
}

fn run<G: ScreenGrabber>(mut grabber: G, settings: &Settings) -> Result<(), RenderError> {
    let (width, height) = grabber.display_size()?;
    info!("Display is {}x{}", width, height);
    let session = RenderSession::new(grabber, settings.wave, settings.threads)?;

    match &settings.snapshot {
        Some(path) => write_snapshot(session, (width, height), settings.phase, path),
        None => run_win(session, (width, height), settings),
    }
}

fn write_snapshot<G: ScreenGrabber>(
    mut session: RenderSession<G>,
    (width, height): (usize, usize),
    phase: f64,
    path: &Path,
) -> Result<(), RenderError> {
    let mut host = OffscreenHost::new(width, height);
    let outcome = session.render_frame(&mut host, phase)?;
    match host.last_frame() {
        Some(frame) if outcome == FrameOutcome::Rendered => {
            frame.to_rgba_image().save(path)?;
            info!("Wrote {}x{} frame to {}", width, height, path.display());
            Ok(())
        }
        _ => Err(RenderError::NoFrame(outcome)),
    }
}

fn run_win<G: ScreenGrabber>(
    mut session: RenderSession<G>,
    (width, height): (usize, usize),
    settings: &Settings,
) -> Result<(), RenderError> {
    let mut host = WindowHost::new("Wavy Mirror", width, height)?;

    let clock = Arc::new(AnimationClock::new(settings.phase, settings.step));
    let ticker = Ticker::spawn(Arc::clone(&clock), settings.interval)?;
    // draw straight away instead of waiting for the first tick
    clock.invalidate();

    while host.is_open() {
        if clock.take_repaint() {
            session.render_frame(&mut host, clock.phase())?;
        } else {
            host.pump();
        }
    }
    drop(ticker);

    info!(
        "Stopped after {} ticks, {} frames ({})",
        clock.ticks(),
        session.metrics().rendered,
        session.metrics()
    );
    Ok(())
}
