use image::RgbaImage;
use log::debug;

use super::color::{Color, PixelFormat};
use crate::error::SurfaceError;

pub const BYTES_PER_PIXEL: usize = 4;

/// A frame of 4-byte pixels stored row by row.
///
/// `data.len()` is always `stride * height`, so the buffer splits cleanly into
/// rows with `chunks(stride)`. Bytes past `width * 4` in a row are padding and
/// are never read or written by the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelSurface {
    width: usize,
    height: usize,
    stride: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelSurface {
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Result<Self, SurfaceError> {
        Self::with_stride(width, height, width.saturating_mul(BYTES_PER_PIXEL), format)
    }

    /// Build a surface whose rows are padded out to `stride` bytes.
    pub fn with_stride(
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::ZeroSize { width, height });
        }
        if stride < width * BYTES_PER_PIXEL {
            return Err(SurfaceError::StrideTooSmall { width, stride });
        }
        let alloc_err = |bytes| SurfaceError::Allocation {
            width,
            height,
            bytes,
        };
        let len = stride.checked_mul(height).ok_or(alloc_err(usize::MAX))?;

        // try_reserve so an OOM becomes an error instead of an abort
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| alloc_err(len))?;
        data.resize(len, 0);

        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    /// Copy an `image` buffer into a tightly packed RGBA surface.
    pub fn from_rgba_image(img: &RgbaImage) -> Result<Self, SurfaceError> {
        let mut surface = Self::new(img.width() as usize, img.height() as usize, PixelFormat::Rgba)?;
        let row_bytes = surface.row_bytes();
        for (y, row) in img.as_raw().chunks_exact(row_bytes).enumerate() {
            surface.row_mut(y).copy_from_slice(row);
        }
        Ok(surface)
    }

    /// Export as an RGBA image, swizzling if needed and dropping row padding.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut out = Vec::with_capacity(self.width * self.height * BYTES_PER_PIXEL);
        for y in 0..self.height {
            for px in self.row(y).chunks_exact(BYTES_PER_PIXEL) {
                let px = [px[0], px[1], px[2], px[3]];
                out.extend_from_slice(&self.format.convert(PixelFormat::Rgba, px));
            }
        }
        // length always matches width * height * 4
        RgbaImage::from_raw(self.width as u32, self.height as u32, out)
            .unwrap_or_else(|| RgbaImage::new(self.width as u32, self.height as u32))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes of real pixel data in one row.
    pub fn row_bytes(&self) -> usize {
        self.width * BYTES_PER_PIXEL
    }

    pub fn matches(&self, width: usize, height: usize, format: PixelFormat) -> bool {
        self.width == width && self.height == height && self.format == format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.stride;
        let end = start + self.row_bytes();
        &mut self.data[start..end]
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = y * self.stride + x * BYTES_PER_PIXEL;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, px: [u8; 4]) {
        if x < self.width && y < self.height {
            let i = y * self.stride + x * BYTES_PER_PIXEL;
            self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&px);
        }
    }

    pub fn fill(&mut self, color: Color) {
        let px = color.to_bytes(self.format);
        for y in 0..self.height {
            for dst in self.row_mut(y).chunks_exact_mut(BYTES_PER_PIXEL) {
                dst.copy_from_slice(&px);
            }
        }
    }
}

/// Make sure `slot` holds a surface of exactly `width` x `height` in `format`.
///
/// A stale surface is dropped before the new one is allocated so the old and
/// new buffers are never alive together. If allocation fails the slot is left
/// empty.
pub fn ensure_surface(
    slot: &mut Option<PixelSurface>,
    width: usize,
    height: usize,
    format: PixelFormat,
) -> Result<&mut PixelSurface, SurfaceError> {
    let stale = slot
        .as_ref()
        .map_or(true, |s| !s.matches(width, height, format));
    if stale {
        if let Some(old) = slot.take() {
            debug!(
                "Releasing {}x{} surface for {}x{}",
                old.width, old.height, width, height
            );
        }
        *slot = Some(PixelSurface::new(width, height, format)?);
    }
    slot.as_mut().ok_or(SurfaceError::ZeroSize { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            PixelSurface::new(0, 4, PixelFormat::Rgba),
            Err(SurfaceError::ZeroSize { .. })
        ));
        assert!(matches!(
            PixelSurface::new(4, 0, PixelFormat::Rgba),
            Err(SurfaceError::ZeroSize { .. })
        ));
    }

    #[test]
    fn rejects_short_stride() {
        assert!(matches!(
            PixelSurface::with_stride(4, 4, 15, PixelFormat::Rgba),
            Err(SurfaceError::StrideTooSmall { .. })
        ));
    }

    #[test]
    fn huge_surface_is_an_allocation_error() {
        let res = PixelSurface::with_stride(1, usize::MAX / 2, usize::MAX / 2, PixelFormat::Rgba);
        assert!(matches!(res, Err(SurfaceError::Allocation { .. })));
    }

    #[test]
    fn padded_rows_keep_pixels_apart() {
        let mut s = PixelSurface::with_stride(2, 2, 16, PixelFormat::Rgba).unwrap();
        assert_eq!(s.data().len(), 32);
        s.set_pixel(1, 1, [9, 8, 7, 6]);
        assert_eq!(s.pixel(1, 1), [9, 8, 7, 6]);
        assert_eq!(&s.data()[20..24], &[9, 8, 7, 6]);
        assert!(s.data()[24..].iter().all(|&b| b == 0));
        // out of range writes are ignored
        s.set_pixel(2, 0, [1, 1, 1, 1]);
        assert_eq!(s.row(0), &[0u8; 8]);
    }

    #[test]
    fn image_round_trip_swizzles_bgra() {
        let mut s = PixelSurface::new(2, 1, PixelFormat::Bgra).unwrap();
        s.fill(Color::RED);
        assert_eq!(s.pixel(0, 0), [0, 0, 255, 255]);
        let img = s.to_rgba_image();
        assert_eq!(img.get_pixel(1, 0).0, [255, 0, 0, 255]);
        let back = PixelSurface::from_rgba_image(&img).unwrap();
        assert_eq!(back.pixel(1, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn ensure_reuses_and_reallocates() {
        let mut slot = None;
        ensure_surface(&mut slot, 4, 3, PixelFormat::Rgba)
            .unwrap()
            .set_pixel(0, 0, [1, 2, 3, 4]);

        // same size keeps the old contents
        let s = ensure_surface(&mut slot, 4, 3, PixelFormat::Rgba).unwrap();
        assert_eq!(s.pixel(0, 0), [1, 2, 3, 4]);

        let s = ensure_surface(&mut slot, 8, 2, PixelFormat::Rgba).unwrap();
        assert_eq!(s.dims(), (8, 2));
        assert_eq!(s.pixel(0, 0), [0, 0, 0, 0]);

        assert!(ensure_surface(&mut slot, 0, 2, PixelFormat::Rgba).is_err());
        assert!(slot.is_none());
    }
}
