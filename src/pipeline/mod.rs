use crate::core::PixelSurface;
use crate::error::RenderError;

pub mod capture;
pub mod compositor;
pub mod pipeline;
pub mod window_pipeline;

pub use capture::{FrameSource, PatternGrabber, RawFrame, ScreenGrabber, XcapGrabber};
pub use compositor::compose;
pub use pipeline::{FrameOutcome, RenderSession};
pub use window_pipeline::{pack_surface, WindowHost};

/// What the render loop needs from the windowing layer.
pub trait DisplayHost {
    /// Current size of the drawable area in pixels.
    fn drawable_size(&self) -> (usize, usize);

    /// False once the user has asked to quit or the window is gone.
    fn is_open(&self) -> bool;

    /// Draw `surface` at (0, 0), 1:1.
    fn present(&mut self, surface: &PixelSurface) -> Result<(), RenderError>;

    /// Service window events when there is nothing new to draw.
    fn pump(&mut self) {}
}

/// Host with no window: keeps the last presented frame. Used for snapshots.
#[derive(Debug, Default)]
pub struct OffscreenHost {
    size: (usize, usize),
    last: Option<PixelSurface>,
}

impl OffscreenHost {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            size: (width, height),
            last: None,
        }
    }

    pub fn last_frame(&self) -> Option<&PixelSurface> {
        self.last.as_ref()
    }
}

impl DisplayHost for OffscreenHost {
    fn drawable_size(&self) -> (usize, usize) {
        self.size
    }

    fn is_open(&self) -> bool {
        true
    }

    fn present(&mut self, surface: &PixelSurface) -> Result<(), RenderError> {
        self.last = Some(surface.clone());
        Ok(())
    }
}
