use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;

use crate::core::{wave::clamp_offset, PixelSurface, WaveState, BYTES_PER_PIXEL};
use crate::error::WarpError;

/// Warp `source` into `dest`, one rayon task per destination row.
///
/// Every destination pixel gets the 4 bytes of exactly one source pixel, picked
/// by [`WaveState::sample`]. Rows only read the shared source and the column
/// offset table, so the only synchronisation is the join at the end. Runs on
/// whatever rayon pool is current, so wrap it in `ThreadPool::install` to bound
/// the worker count.
pub fn compose(
    source: &PixelSurface,
    dest: &mut PixelSurface,
    wave: &WaveState,
) -> Result<(), WarpError> {
    debug_assert_eq!(
        source.dims(),
        dest.dims(),
        "warp surfaces must be reallocated together"
    );
    if source.dims() != dest.dims() {
        let (src_w, src_h) = source.dims();
        let (dst_w, dst_h) = dest.dims();
        return Err(WarpError::DimensionMismatch {
            src_w,
            src_h,
            dst_w,
            dst_h,
        });
    }
    if source.format() != dest.format() {
        return Err(WarpError::FormatMismatch);
    }

    let (width, height) = source.dims();
    let src = source.data();
    let src_stride = source.stride();
    let row_bytes = dest.row_bytes();
    let dst_stride = dest.stride();

    // The vertical wave only depends on x, so it's shared by every row.
    let column_offsets: Vec<isize> = (0..width).map(|x| wave.vertical_offset(x)).collect();

    dest.data_mut()
        .par_chunks_mut(dst_stride)
        .enumerate()
        .for_each(|(y, row)| {
            let dx = wave.horizontal_offset(y);
            for (x, dst) in row[..row_bytes]
                .chunks_exact_mut(BYTES_PER_PIXEL)
                .enumerate()
            {
                let sx = clamp_offset(x, dx, width);
                let sy = clamp_offset(y, column_offsets[x], height);
                let i = sy * src_stride + sx * BYTES_PER_PIXEL;
                dst.copy_from_slice(&src[i..i + BYTES_PER_PIXEL]);
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Color, PixelFormat, Rounding, WaveParameters};
    use std::collections::HashSet;
    use std::f64::consts::PI;

    fn wave(amplitude: f64, frequency: f64, phase: f64) -> WaveState {
        WaveParameters::new(amplitude, frequency, Rounding::Nearest).at_phase(phase)
    }

    /// Every pixel encodes its own coordinate, so sampled positions can be read
    /// back out of the destination.
    fn coordinate_surface(width: usize, height: usize) -> PixelSurface {
        let mut s = PixelSurface::new(width, height, PixelFormat::Rgba).unwrap();
        for y in 0..height {
            for x in 0..width {
                s.set_pixel(x, y, [x as u8, y as u8, (x ^ y) as u8, 255]);
            }
        }
        s
    }

    fn blank_like(s: &PixelSurface) -> PixelSurface {
        PixelSurface::new(s.width(), s.height(), s.format()).unwrap()
    }

    #[test]
    fn all_red_with_no_amplitude_is_unchanged() {
        let mut src = PixelSurface::new(4, 4, PixelFormat::Rgba).unwrap();
        src.fill(Color::RED);
        let mut dst = blank_like(&src);
        compose(&src, &mut dst, &wave(0.0, 0.05, 3.0)).unwrap();
        assert_eq!(dst, src);
        assert_eq!(dst.pixel(2, 2), [255, 0, 0, 255]);
    }

    #[test]
    fn zero_amplitude_is_identity_for_any_phase() {
        let src = coordinate_surface(31, 17);
        for (freq, phase) in [(0.0, 0.0), (0.05, 1.0), (1.7, -40.0)] {
            let mut dst = blank_like(&src);
            compose(&src, &mut dst, &wave(0.0, freq, phase)).unwrap();
            assert_eq!(dst.data(), src.data());
        }
    }

    #[test]
    fn two_by_two_shifts_down_one_row() {
        let (tl, tr, bl, br) = ([1, 0, 0, 255], [2, 0, 0, 255], [3, 0, 0, 255], [4, 0, 0, 255]);
        let mut src = PixelSurface::new(2, 2, PixelFormat::Rgba).unwrap();
        src.set_pixel(0, 0, tl);
        src.set_pixel(1, 0, tr);
        src.set_pixel(0, 1, bl);
        src.set_pixel(1, 1, br);

        let mut dst = blank_like(&src);
        compose(&src, &mut dst, &wave(1.0, 0.0, 0.0)).unwrap();

        assert_eq!(dst.pixel(0, 0), bl);
        assert_eq!(dst.pixel(1, 0), br);
        // bottom row clamps onto itself
        assert_eq!(dst.pixel(0, 1), bl);
        assert_eq!(dst.pixel(1, 1), br);
    }

    #[test]
    fn matches_per_pixel_sample() {
        let src = coordinate_surface(64, 48);
        let w = wave(20.0, 0.05, 7.3);
        let mut dst = blank_like(&src);
        compose(&src, &mut dst, &w).unwrap();

        for y in 0..48 {
            for x in 0..64 {
                let (sx, sy) = w.sample(x, y, 64, 48);
                assert_eq!(dst.pixel(x, y), src.pixel(sx, sy), "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn output_is_deterministic() {
        let src = coordinate_surface(50, 40);
        let w = wave(12.0, 0.21, 99.9);
        let mut a = blank_like(&src);
        let mut b = blank_like(&src);
        compose(&src, &mut a, &w).unwrap();
        compose(&src, &mut b, &w).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn every_output_pixel_comes_from_source() {
        let src = coordinate_surface(40, 30);
        let known: HashSet<[u8; 4]> = (0..30)
            .flat_map(|y| (0..40).map(move |x| (x, y)))
            .map(|(x, y)| src.pixel(x, y))
            .collect();

        let mut dst = blank_like(&src);
        compose(&src, &mut dst, &wave(25.0, 0.4, 2.0)).unwrap();
        for y in 0..30 {
            for x in 0..40 {
                assert!(known.contains(&dst.pixel(x, y)), "blended pixel at ({x}, {y})");
            }
        }
    }

    #[test]
    fn out_of_range_samples_take_edge_pixels() {
        let src = coordinate_surface(10, 10);
        let mut dst = blank_like(&src);

        // phase pi gives cos = -1, pulling every row from above the top edge
        compose(&src, &mut dst, &wave(50.0, 0.0, PI)).unwrap();
        for x in 0..10 {
            assert_eq!(dst.pixel(x, 9), src.pixel(x, 0));
        }

        compose(&src, &mut dst, &wave(50.0, 0.0, 0.0)).unwrap();
        for x in 0..10 {
            assert_eq!(dst.pixel(x, 0), src.pixel(x, 9));
        }
    }

    #[test]
    fn stride_padding_is_left_alone() {
        let src = coordinate_surface(3, 3);
        let mut dst = PixelSurface::with_stride(3, 3, 20, PixelFormat::Rgba).unwrap();
        dst.data_mut().iter_mut().for_each(|b| *b = 0xAB);
        compose(&src, &mut dst, &wave(0.0, 0.0, 0.0)).unwrap();
        for y in 0..3 {
            assert_eq!(dst.row(y), src.row(y));
            assert_eq!(&dst.data()[y * 20 + 12..y * 20 + 20], &[0xAB; 8]);
        }
    }

    #[test]
    fn runs_inside_a_bounded_pool() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let src = coordinate_surface(33, 33);
        let w = wave(4.0, 0.3, 0.5);
        let mut pooled = blank_like(&src);
        let mut global = blank_like(&src);
        pool.install(|| compose(&src, &mut pooled, &w)).unwrap();
        compose(&src, &mut global, &w).unwrap();
        assert_eq!(pooled, global);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "reallocated together"))]
    fn mismatched_sizes_fail_fast() {
        let src = coordinate_surface(4, 4);
        let mut dst = PixelSurface::new(4, 5, PixelFormat::Rgba).unwrap();
        let res = compose(&src, &mut dst, &wave(1.0, 1.0, 1.0));
        assert!(matches!(res, Err(WarpError::DimensionMismatch { .. })));
    }
}
