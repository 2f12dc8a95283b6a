use bytemuck::{Pod, Zeroable};

/// Straight-alpha RGBA color, components in `[0, 1]`.
///
/// Laid out as four `f32`s so it can be uploaded as-is into a `vec4<f32>` uniform.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Returns a copy with the red channel replaced.
    #[inline]
    pub const fn with_r(self, r: f32) -> Self {
        Self { r, ..self }
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layout_is_16_bytes() {
        assert_eq!(std::mem::size_of::<Color>(), 16);
        let c = Color::rgba(0.2, 0.3, 0.8, 1.0);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&c));
        assert_eq!(floats, &[0.2, 0.3, 0.8, 1.0]);
    }

    #[test]
    fn with_r_keeps_other_channels() {
        let c = Color::rgba(0.2, 0.3, 0.8, 1.0).with_r(0.65);
        assert_eq!(c.to_array(), [0.65, 0.3, 0.8, 1.0]);
    }
}
