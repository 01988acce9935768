use image::RgbaImage;
use log::{debug, info};
use xcap::Monitor;

use crate::core::{ensure_surface, Color, PixelFormat, PixelSurface, BYTES_PER_PIXEL};
use crate::error::{CaptureError, SurfaceError};

/// Raw pixels handed over by a [`ScreenGrabber`].
///
/// Row `y` starts at byte `y * stride` and holds `width` 4-byte pixels in
/// `format` order.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub format: PixelFormat,
    pub bytes: Vec<u8>,
}

impl RawFrame {
    pub fn from_rgba_image(img: RgbaImage) -> Self {
        let width = img.width() as usize;
        Self {
            width,
            height: img.height() as usize,
            stride: width * BYTES_PER_PIXEL,
            format: PixelFormat::Rgba,
            bytes: img.into_raw(),
        }
    }

    /// Check the frame covers `width` x `height` before anything is copied.
    pub fn validate(&self, width: usize, height: usize) -> Result<(), CaptureError> {
        if self.width < width || self.height < height {
            return Err(CaptureError::ShortFrame {
                got_w: self.width,
                got_h: self.height,
                want_w: width,
                want_h: height,
            });
        }
        let row_bytes = width * BYTES_PER_PIXEL;
        let expected = (height - 1) * self.stride + row_bytes;
        if self.stride < row_bytes || self.bytes.len() < expected {
            return Err(CaptureError::Truncated {
                len: self.bytes.len(),
                expected,
            });
        }
        Ok(())
    }

    fn row(&self, y: usize, row_bytes: usize) -> &[u8] {
        let start = y * self.stride;
        &self.bytes[start..start + row_bytes]
    }
}

/// Reads pixels off a display.
pub trait ScreenGrabber {
    /// Size of the display that holds the origin.
    fn display_size(&mut self) -> Result<(usize, usize), CaptureError>;

    /// Pixels of the `width` x `height` region whose top-left is `(x, y)`.
    fn capture_region(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<RawFrame, CaptureError>;
}

/// Captures the monitor that contains the desktop origin via `xcap`.
#[derive(Default)]
pub struct XcapGrabber {
    monitor: Option<Monitor>,
}

impl XcapGrabber {
    pub fn new() -> Self {
        Self::default()
    }

    fn monitor(&mut self) -> Result<&Monitor, CaptureError> {
        if self.monitor.is_none() {
            let monitor =
                Monitor::from_point(0, 0).map_err(|_| CaptureError::NoDisplay { x: 0, y: 0 })?;
            info!("Capturing display {:?}", monitor.name().unwrap_or_default());
            self.monitor = Some(monitor);
        }
        self.monitor
            .as_ref()
            .ok_or(CaptureError::NoDisplay { x: 0, y: 0 })
    }
}

impl ScreenGrabber for XcapGrabber {
    fn display_size(&mut self) -> Result<(usize, usize), CaptureError> {
        let monitor = self.monitor()?;
        Ok((monitor.width()? as usize, monitor.height()? as usize))
    }

    fn capture_region(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<RawFrame, CaptureError> {
        let grabbed = self.monitor()?.capture_image();
        let image = match grabbed {
            Ok(image) => image,
            Err(e) => {
                // the monitor may have gone away; look it up again next frame
                self.monitor = None;
                return Err(e.into());
            }
        };
        let mut frame = RawFrame::from_rgba_image(image);

        if x > 0 || y > 0 {
            let (x, y) = (x as usize, y as usize);
            if x >= frame.width || y >= frame.height {
                return Err(CaptureError::ShortFrame {
                    got_w: frame.width,
                    got_h: frame.height,
                    want_w: x + width as usize,
                    want_h: y + height as usize,
                });
            }
            let offset = y * frame.stride + x * BYTES_PER_PIXEL;
            frame.bytes = frame.bytes.split_off(offset);
            frame.width -= x;
            frame.height -= y;
        }
        Ok(frame)
    }
}

/// Static test card: a colour gradient with a checker overlay. Stands in for
/// the screen where the display can't be read.
pub struct PatternGrabber {
    size: (usize, usize),
    cell: usize,
}

impl PatternGrabber {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            size: (width, height),
            cell: 64,
        }
    }

    pub fn color_at(&self, x: usize, y: usize) -> Color {
        let (w, h) = self.size;
        let tx = x as f32 / w.max(2).saturating_sub(1) as f32;
        let ty = y as f32 / h.max(2).saturating_sub(1) as f32;
        let top = Color::NAVY.lerp(&Color::TEAL, tx);
        let bottom = Color::MAGENTA.lerp(&Color::YELLOW, tx);
        let base = top.lerp(&bottom, ty);
        if ((x / self.cell) + (y / self.cell)) % 2 == 0 {
            base
        } else {
            base.lerp(&Color::WHITE, 0.25)
        }
    }
}

impl ScreenGrabber for PatternGrabber {
    fn display_size(&mut self) -> Result<(usize, usize), CaptureError> {
        Ok(self.size)
    }

    fn capture_region(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<RawFrame, CaptureError> {
        let (width, height) = (width as usize, height as usize);
        let mut bytes = Vec::with_capacity(width * height * BYTES_PER_PIXEL);
        for py in 0..height {
            for px in 0..width {
                let c = self.color_at(px + x as usize, py + y as usize);
                bytes.extend_from_slice(&c.to_bytes(PixelFormat::Rgba));
            }
        }
        Ok(RawFrame {
            width,
            height,
            stride: width * BYTES_PER_PIXEL,
            format: PixelFormat::Rgba,
            bytes,
        })
    }
}

/// Owns the capture surface and refills it from a [`ScreenGrabber`].
pub struct FrameSource<G: ScreenGrabber> {
    grabber: G,
    surface: Option<PixelSurface>,
}

impl<G: ScreenGrabber> FrameSource<G> {
    pub fn new(grabber: G) -> Self {
        Self {
            grabber,
            surface: None,
        }
    }

    pub fn grabber_mut(&mut self) -> &mut G {
        &mut self.grabber
    }

    pub fn surface(&self) -> Option<&PixelSurface> {
        self.surface.as_ref()
    }

    /// Copy the `width` x `height` region at the origin into the capture
    /// surface.
    ///
    /// The surface adopts the grabber's channel order. It is reallocated when
    /// size or order changes and is never touched if the grab fails.
    pub fn capture(&mut self, width: usize, height: usize) -> Result<&PixelSurface, CaptureError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::ZeroSize { width, height }.into());
        }
        let frame = self
            .grabber
            .capture_region(0, 0, width as u32, height as u32)?;
        frame.validate(width, height)?;

        let surface = ensure_surface(&mut self.surface, width, height, frame.format)?;
        let row_bytes = surface.row_bytes();
        for y in 0..height {
            surface.row_mut(y).copy_from_slice(frame.row(y, row_bytes));
        }
        debug!("Captured {}x{} frame", width, height);
        Ok(surface)
    }
}
