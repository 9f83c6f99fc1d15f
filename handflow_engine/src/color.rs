//! Colour types used by the renderers.
//!
//! Genre systems think in HSL (hue drift, saturation fall-off); the
//! framebuffer stores packed `0xAARRGGBB`.

// ════════════════════════════════════════════════════════════════════════════
// Rgba
// ════════════════════════════════════════════════════════════════════════════

/// Straight (non-premultiplied) colour, every channel in 0.0–1.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Rgba { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Rgba { a: a.clamp(0.0, 1.0), ..self }
    }

    /// Channel-wise interpolation. `t` = 0.0 → `self`, `t` = 1.0 → `other`.
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Pack into `0xAARRGGBB`.
    pub fn to_argb(self) -> u32 {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (q(self.a) << 24) | (q(self.r) << 16) | (q(self.g) << 8) | q(self.b)
    }

    pub fn from_argb(c: u32) -> Self {
        let u = |shift: u32| ((c >> shift) & 0xFF) as f32 / 255.0;
        Rgba { r: u(16), g: u(8), b: u(0), a: u(24) }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HSL → RGB
// ════════════════════════════════════════════════════════════════════════════

/// Build a colour from hue (degrees, any range, wrapped mod 360),
/// saturation and lightness (0.0–1.0) and alpha.
pub fn hsla(h: f32, s: f32, l: f32, a: f32) -> Rgba {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    Rgba::new(r + m, g + m, b + m, a.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn primary_hues() {
        let red = hsla(0.0, 1.0, 0.5, 1.0);
        assert!(close(red.r, 1.0) && close(red.g, 0.0) && close(red.b, 0.0));
        let blue = hsla(240.0, 1.0, 0.5, 1.0);
        assert!(close(blue.b, 1.0) && close(blue.r, 0.0));
    }

    #[test]
    fn hue_wraps_past_360() {
        // The liquid hot regime runs its hue up to 400°.
        assert_eq!(hsla(400.0, 0.8, 0.6, 1.0), hsla(40.0, 0.8, 0.6, 1.0));
        assert_eq!(hsla(-20.0, 0.8, 0.6, 1.0), hsla(340.0, 0.8, 0.6, 1.0));
    }

    #[test]
    fn argb_packing() {
        assert_eq!(Rgba::WHITE.to_argb(), 0xFFFFFFFF);
        assert_eq!(Rgba::BLACK.to_argb(), 0xFF000000);
        let c = Rgba::from_argb(0x80FF0000);
        assert!(close(c.r, 1.0));
        assert!(close(c.a, 128.0 / 255.0));
    }

    #[test]
    fn lerp_endpoints() {
        let a = Rgba::BLACK;
        let b = Rgba::WHITE;
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert!(close(a.lerp(b, 0.5).g, 0.5));
    }
}
