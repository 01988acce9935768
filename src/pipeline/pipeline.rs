use std::time::Instant;

use log::{debug, error, warn};
use rayon::ThreadPool;

use crate::{
    core::{ensure_surface, PixelSurface, WaveParameters},
    error::{CaptureError, RenderError},
    pipeline::{compose, DisplayHost, FrameSource, ScreenGrabber},
    Metrics,
};

/// What happened to one repaint request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A new warped frame was presented.
    Rendered,
    /// Capture failed; the previous output (if any) was shown again.
    Skipped,
    /// A surface could not be allocated; nothing was presented.
    Dropped,
}

/// Capture → warp → present, once per repaint.
///
/// Owns both surfaces. The phase comes in as a plain value so a frame always
/// sees one phase, no matter how often the clock ticks meanwhile.
pub struct RenderSession<G: ScreenGrabber> {
    source: FrameSource<G>,
    output: Option<PixelSurface>,
    params: WaveParameters,
    pool: ThreadPool,
    metrics: Metrics,
}

impl<G: ScreenGrabber> RenderSession<G> {
    /// `threads == 0` lets rayon pick one worker per core.
    pub fn new(grabber: G, params: WaveParameters, threads: usize) -> Result<Self, RenderError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("warp-{i}"))
            .build()?;
        debug!("Warp pool has {} threads", pool.current_num_threads());
        Ok(Self {
            source: FrameSource::new(grabber),
            output: None,
            params,
            pool,
            metrics: Metrics::new(),
        })
    }

    pub fn params(&self) -> &WaveParameters {
        &self.params
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn capture_surface(&self) -> Option<&PixelSurface> {
        self.source.surface()
    }

    pub fn output_surface(&self) -> Option<&PixelSurface> {
        self.output.as_ref()
    }

    pub fn grabber_mut(&mut self) -> &mut G {
        self.source.grabber_mut()
    }

    /// Render one frame at `phase` and hand it to `host`.
    ///
    /// Capture and allocation problems only cost this frame; the next repaint
    /// tries again. Only a failing `present` is returned as an error.
    pub fn render_frame<H: DisplayHost>(
        &mut self,
        host: &mut H,
        phase: f64,
    ) -> Result<FrameOutcome, RenderError> {
        let start = Instant::now();
        let outcome = self.render_inner(host, phase)?;
        self.metrics.record(outcome, start.elapsed());
        self.metrics.maybe_report();
        Ok(outcome)
    }

    fn render_inner<H: DisplayHost>(
        &mut self,
        host: &mut H,
        phase: f64,
    ) -> Result<FrameOutcome, RenderError> {
        let (width, height) = host.drawable_size();

        let captured = match self.source.capture(width, height) {
            Ok(surface) => surface,
            Err(CaptureError::Surface(e)) => {
                error!("Dropping frame: {e}");
                return Ok(FrameOutcome::Dropped);
            }
            Err(e) => {
                warn!("Skipping frame: {e}");
                return represent_last(self.output.as_ref(), host, (width, height));
            }
        };

        let output = match ensure_surface(&mut self.output, width, height, captured.format()) {
            Ok(output) => output,
            Err(e) => {
                error!("Dropping frame: {e}");
                return Ok(FrameOutcome::Dropped);
            }
        };

        let wave = self.params.at_phase(phase);
        self.pool.install(|| compose(captured, output, &wave))?;

        host.present(output)?;
        Ok(FrameOutcome::Rendered)
    }
}

/// Show the last good frame again, unless the display size moved on.
fn represent_last<H: DisplayHost>(
    last: Option<&PixelSurface>,
    host: &mut H,
    size: (usize, usize),
) -> Result<FrameOutcome, RenderError> {
    if let Some(last) = last.filter(|s| s.dims() == size) {
        host.present(last)?;
    }
    Ok(FrameOutcome::Skipped)
}
