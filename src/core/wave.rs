//! The per-pixel warp: which source pixel each destination pixel samples.

use std::fmt::Display;

/// Horizontal ripple amplitude relative to the vertical wave.
pub const HORIZONTAL_AMPLITUDE_SCALE: f64 = 0.7;
/// Spatial frequency multiplier for the horizontal ripple.
pub const HORIZONTAL_FREQUENCY_SCALE: f64 = 0.8;

/// How a floating point displacement becomes a whole pixel offset.
///
/// `Nearest` rounds half away from zero (`f64::round`). `Truncate` drops the
/// fraction toward zero, which is how the effect originally looked; the two
/// differ by at most one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    #[default]
    Nearest,
    Truncate,
}

impl Rounding {
    /// Non-finite input maps to 0 and huge values saturate.
    pub fn apply(self, value: f64) -> isize {
        match self {
            Rounding::Nearest => value.round() as isize,
            Rounding::Truncate => value as isize,
        }
    }
}

impl Display for Rounding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rounding::Nearest => write!(f, "nearest"),
            Rounding::Truncate => write!(f, "truncate"),
        }
    }
}

/// Session constants for the wave. Only the phase changes over time, and it
/// lives in the [`crate::core::AnimationClock`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParameters {
    amplitude: f64,
    frequency: f64,
    rounding: Rounding,
}

impl WaveParameters {
    pub const DEFAULT_AMPLITUDE: f64 = 20.0;
    pub const DEFAULT_FREQUENCY: f64 = 0.05;

    pub fn new(amplitude: f64, frequency: f64, rounding: Rounding) -> Self {
        Self {
            amplitude,
            frequency,
            rounding,
        }
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Freeze the parameters at one phase for a single frame.
    pub fn at_phase(&self, phase: f64) -> WaveState {
        WaveState {
            amplitude: self.amplitude,
            frequency: self.frequency,
            phase,
            rounding: self.rounding,
        }
    }
}

impl Default for WaveParameters {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_AMPLITUDE,
            Self::DEFAULT_FREQUENCY,
            Rounding::default(),
        )
    }
}

/// A read-only wave snapshot shared by every warp worker in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveState {
    pub amplitude: f64,
    pub frequency: f64,
    pub phase: f64,
    pub rounding: Rounding,
}

impl WaveState {
    /// Vertical displacement for column `x`. Moves with the phase.
    pub fn vertical_offset(&self, x: usize) -> isize {
        self.rounding
            .apply(self.amplitude * (self.frequency * x as f64 + self.phase).cos())
    }

    /// Horizontal displacement for row `y`. Static, ignores the phase.
    pub fn horizontal_offset(&self, y: usize) -> isize {
        self.rounding.apply(
            self.amplitude
                * HORIZONTAL_AMPLITUDE_SCALE
                * (self.frequency * y as f64 * HORIZONTAL_FREQUENCY_SCALE).sin(),
        )
    }

    /// Source coordinate for destination `(x, y)` on a `width` x `height`
    /// surface, clamped to the nearest edge pixel. Both sizes must be >= 1.
    pub fn sample(&self, x: usize, y: usize, width: usize, height: usize) -> (usize, usize) {
        let src_x = clamp_offset(x, self.horizontal_offset(y), width);
        let src_y = clamp_offset(y, self.vertical_offset(x), height);
        (src_x, src_y)
    }
}

/// `pos + offset` clamped to `0..len`.
#[inline]
pub fn clamp_offset(pos: usize, offset: isize, len: usize) -> usize {
    let moved = if offset < 0 {
        pos.saturating_sub(offset.unsigned_abs())
    } else {
        pos.saturating_add(offset as usize)
    };
    moved.min(len.saturating_sub(1))
}
