use color::{AlphaColor, Rgba8, Srgb};

/// A packed `0xRRGGBB` color; alpha is tracked separately per vertex
///
/// Conversions & interpolation go through [`AlphaColor<Srgb>`], the packed form only stores
/// the quantized channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xffffff);
    pub const RED: Color = Color(0xff0000);
    pub const GREEN: Color = Color(0x00ff00);
    pub const BLUE: Color = Color(0x0000ff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Opaque [`AlphaColor`] with the same channels
    pub fn to_alpha_color(self) -> AlphaColor<Srgb> {
        AlphaColor::from_rgba8(self.red(), self.green(), self.blue(), 255)
    }

    /// Get normalized `[r, g, b]` components in `[0..1]`
    pub fn components(self) -> [f32; 3] {
        let [r, g, b, _] = self.to_alpha_color().components;
        [r, g, b]
    }

    /// Packs normalized components, clamping to `[0..1]`
    pub fn from_components([r, g, b]: [f32; 3]) -> Self {
        AlphaColor::<Srgb>::new([r, g, b, 1.0]).into()
    }

    /// Per-channel linear interpolation
    pub fn interpolate(self, to: Color, ratio: f32) -> Self {
        self.to_alpha_color()
            .lerp_rect(to.to_alpha_color(), ratio)
            .into()
    }

    pub fn to_rgba(self, alpha: f32) -> [f32; 4] {
        self.to_alpha_color().with_alpha(alpha).components
    }
}

impl From<u32> for Color {
    fn from(value: u32) -> Self {
        Color(value & 0xffffff)
    }
}

impl From<Rgba8> for Color {
    fn from(value: Rgba8) -> Self {
        Color::rgb(value.r, value.g, value.b)
    }
}

// Alpha is dropped; quantization clamps each channel
impl From<AlphaColor<Srgb>> for Color {
    fn from(value: AlphaColor<Srgb>) -> Self {
        value.to_rgba8().into()
    }
}

impl From<Color> for AlphaColor<Srgb> {
    fn from(value: Color) -> Self {
        value.to_alpha_color()
    }
}

// Convert to wgpu::Color (f64 RGBA) for clear colors
impl From<Color> for wgpu::Color {
    fn from(value: Color) -> Self {
        let [r, g, b, a] = value.to_alpha_color().components;
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_round_trip() {
        let c = Color::rgb(0x12, 0xab, 0xff);
        assert_eq!(c, Color(0x12abff));
        assert_eq!((c.red(), c.green(), c.blue()), (0x12, 0xab, 0xff));
        assert_eq!(Color::from_components(c.components()), c);
    }

    #[test]
    fn interpolation_hits_endpoints() {
        assert_eq!(Color::BLACK.interpolate(Color::WHITE, 0.0), Color::BLACK);
        assert_eq!(Color::BLACK.interpolate(Color::WHITE, 1.0), Color::WHITE);
        assert_eq!(Color::RED.interpolate(Color::BLUE, 0.5), Color::rgb(128, 0, 128));
    }

    #[test]
    fn alpha_color_conversions() {
        let c = Color(0x336699);
        let alpha: AlphaColor<Srgb> = c.into();
        assert_eq!(alpha.to_rgba8().to_u8_array(), [0x33, 0x66, 0x99, 0xff]);
        assert_eq!(Color::from(alpha.with_alpha(0.25)), c);

        // out of range components clamp instead of wrapping
        assert_eq!(Color::from_components([1.5, -0.2, 0.0]), Color::RED);
        assert_eq!(c.to_rgba(0.5)[3], 0.5);
    }
}
