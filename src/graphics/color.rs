use bytemuck::{Pod, Zeroable};

/// Linear RGBA color.
#[repr(C)]
#[derive(Copy, Clone, PartialEq, Debug, Pod, Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {

    pub const WHITE: Color      = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color      = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: Color        = Color::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color      = Color::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color       = Color::new(0.0, 0.0, 1.0, 1.0);
    pub const YELLOW: Color     = Color::new(1.0, 1.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /**
     * Opaque color from a packed sRGB hex triplet, such as `0x44aa88`.
     * Channels are converted to linear space.
     */
    pub fn hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self::rgb(channel(16), channel(8), channel(0))
    }

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    /// Multiplies rgb, leaving alpha untouched.
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor, self.a)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    }
    else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}


#[cfg(test)]
mod test {
    use super::Color;

    #[test]
    fn hex_extremes() {
        let close = |a: Color, b: Color| a.to_array().iter().zip(b.to_array()).all(|(a, b)| (a - b).abs() < 1e-6);
        assert!(close(Color::WHITE, Color::hex(0xffffff)));
        assert!(close(Color::BLACK, Color::hex(0x000000)));
        assert!(close(Color::RED, Color::hex(0xff0000)));
    }

    #[test]
    fn hex_is_linearized() {
        let gray = Color::hex(0x808080);
        assert!((gray.r - 0.2158605).abs() < 1e-4, "{}", gray.r);
        assert_eq!(gray.r, gray.g);
        assert_eq!(gray.g, gray.b);
    }
}
