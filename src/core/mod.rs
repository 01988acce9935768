pub mod clock;
pub mod color;
pub mod surface;
pub mod wave;

pub use clock::{AnimationClock, Ticker};
pub use color::{Color, PixelFormat};
pub use surface::{ensure_surface, PixelSurface, BYTES_PER_PIXEL};
pub use wave::{Rounding, WaveParameters, WaveState};
