use minifb::{Key, Scale, ScaleMode, Window, WindowOptions};
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;

use crate::core::{PixelSurface, BYTES_PER_PIXEL};
use crate::error::RenderError;
use crate::pipeline::DisplayHost;

/// Borderless, always-on-top minifb window covering the display.
/// ESC or Q closes it.
pub struct WindowHost {
    window: Window,
    buffer: Vec<u32>,
}

impl WindowHost {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, RenderError> {
        let opts = WindowOptions {
            borderless: true,
            title: false,
            resize: true,
            topmost: true,
            scale: Scale::X1,
            scale_mode: ScaleMode::UpperLeft,
            ..WindowOptions::default()
        };
        let mut window = Window::new(title, width, height, opts)?;
        window.set_position(0, 0);
        Ok(Self {
            window,
            buffer: Vec::with_capacity(width * height),
        })
    }

    fn quit_requested(&self) -> bool {
        self.window.is_key_down(Key::Escape) || self.window.is_key_down(Key::Q)
    }
}

impl DisplayHost for WindowHost {
    fn drawable_size(&self) -> (usize, usize) {
        self.window.get_size()
    }

    fn is_open(&self) -> bool {
        self.window.is_open() && !self.quit_requested()
    }

    fn present(&mut self, surface: &PixelSurface) -> Result<(), RenderError> {
        pack_surface(surface, &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, surface.width(), surface.height())?;
        Ok(())
    }

    fn pump(&mut self) {
        self.window.update();
    }
}

/// Convert a surface into minifb's 0x00RRGGBB pixels, one row per task.
pub fn pack_surface(surface: &PixelSurface, buffer: &mut Vec<u32>) {
    let (width, height) = surface.dims();
    let format = surface.format();
    buffer.resize(width * height, 0);
    buffer
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (dst, px) in row.iter_mut().zip(surface.row(y).chunks_exact(BYTES_PER_PIXEL)) {
                *dst = format.to_u32(px);
            }
        });
}
