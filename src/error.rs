use thiserror::Error;

/// Failures while creating or resizing a [`crate::core::PixelSurface`].
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface must be at least 1x1, got {width}x{height}")]
    ZeroSize { width: usize, height: usize },
    #[error("stride {stride} is smaller than a {width} pixel row")]
    StrideTooSmall { width: usize, stride: usize },
    #[error("could not allocate {bytes} bytes for a {width}x{height} surface")]
    Allocation {
        width: usize,
        height: usize,
        bytes: usize,
    },
}

/// Failures reading the display.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no display found at ({x}, {y})")]
    NoDisplay { x: i32, y: i32 },
    #[error("display capture failed: {0}")]
    Unavailable(String),
    #[error("captured frame is {got_w}x{got_h}, need at least {want_w}x{want_h}")]
    ShortFrame {
        got_w: usize,
        got_h: usize,
        want_w: usize,
        want_h: usize,
    },
    #[error("raw frame holds {len} bytes, expected {expected}")]
    Truncated { len: usize, expected: usize },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

impl From<xcap::XCapError> for CaptureError {
    fn from(err: xcap::XCapError) -> Self {
        CaptureError::Unavailable(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum WarpError {
    #[error("source is {src_w}x{src_h} but destination is {dst_w}x{dst_h}")]
    DimensionMismatch {
        src_w: usize,
        src_h: usize,
        dst_w: usize,
        dst_h: usize,
    },
    #[error("source and destination channel orders differ")]
    FormatMismatch,
}

/// Errors that stop the render loop or the program.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("window error: {0}")]
    Window(String),
    #[error("could not build the warp thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Warp(#[from] WarpError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("no frame could be rendered ({0:?})")]
    NoFrame(crate::pipeline::FrameOutcome),
    #[error("could not write snapshot: {0}")]
    Snapshot(#[from] image::ImageError),
    #[error("could not start the ticker thread: {0}")]
    Ticker(#[from] std::io::Error),
    #[error("could not install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

impl From<minifb::Error> for RenderError {
    fn from(err: minifb::Error) -> Self {
        RenderError::Window(err.to_string())
    }
}
