/// Byte order of the four channels in a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    #[default]
    Rgba,
    Bgra,
}

impl PixelFormat {
    /// Reorder one pixel from `self` into `target` order.
    pub fn convert(self, target: PixelFormat, px: [u8; 4]) -> [u8; 4] {
        if self == target {
            px
        } else {
            // Rgba <-> Bgra is the same swap both ways
            [px[2], px[1], px[0], px[3]]
        }
    }

    /// Pack a pixel as 0x00RRGGBB, which is what minifb wants.
    pub fn to_u32(self, px: &[u8]) -> u32 {
        let (r, g, b) = match self {
            PixelFormat::Rgba => (px[0], px[1], px[2]),
            PixelFormat::Bgra => (px[2], px[1], px[0]),
        };
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }
}

/// One RGBA pixel, mostly used to build test and pattern frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_bytes(self, format: PixelFormat) -> [u8; 4] {
        PixelFormat::Rgba.convert(format, [self.r, self.g, self.b, self.a])
    }

    /// Linear blend, used for the pattern source gradients.
    pub fn lerp(&self, end: &Color, t: f32) -> Color {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, end.r),
            g: mix(self.g, end.g),
            b: mix(self.b, end.b),
            a: mix(self.a, end.a),
        }
    }
}

// Predefined colors
impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const CYAN: Color = Color::new(0, 255, 255);
    pub const MAGENTA: Color = Color::new(255, 0, 255);
    pub const NAVY: Color = Color::new(0, 0, 128);
    pub const TEAL: Color = Color::new(0, 128, 128);
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swizzle_is_its_own_inverse() {
        let px = [1, 2, 3, 4];
        let bgra = PixelFormat::Rgba.convert(PixelFormat::Bgra, px);
        assert_eq!(bgra, [3, 2, 1, 4]);
        assert_eq!(PixelFormat::Bgra.convert(PixelFormat::Rgba, bgra), px);
        assert_eq!(PixelFormat::Rgba.convert(PixelFormat::Rgba, px), px);
    }

    #[test]
    fn packs_for_minifb() {
        assert_eq!(PixelFormat::Rgba.to_u32(&[0x11, 0x22, 0x33, 0xFF]), 0x0011_2233);
        assert_eq!(PixelFormat::Bgra.to_u32(&[0x33, 0x22, 0x11, 0xFF]), 0x0011_2233);
    }

    #[test]
    fn lerp_endpoints() {
        assert_eq!(Color::RED.lerp(&Color::BLUE, 0.0), Color::RED);
        assert_eq!(Color::RED.lerp(&Color::BLUE, 1.0), Color::BLUE);
    }
}
