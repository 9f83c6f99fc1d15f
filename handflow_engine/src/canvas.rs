//! Drawing surface abstraction and the software framebuffer behind it.
//!
//! Renderers only ever talk to [`Canvas`].  [`Framebuffer`] rasterizes into
//! a `Vec<u32>` of `0xAARRGGBB` pixels that a window can blit directly;
//! [`DrawRecorder`] keeps the command list instead, for headless inspection.

use glam::Vec2;

use crate::color::Rgba;

// ════════════════════════════════════════════════════════════════════════════
// Canvas trait
// ════════════════════════════════════════════════════════════════════════════

/// The four primitives the engine draws with.  Every primitive alpha-blends
/// (source-over) using `color.a`.
pub trait Canvas {
    /// Composite `color` over every pixel of the surface.
    fn fill_surface(&mut self, color: Rgba);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba);
}

// ════════════════════════════════════════════════════════════════════════════
// Framebuffer
// ════════════════════════════════════════════════════════════════════════════

/// CPU framebuffer, row-major, always fully opaque.
pub struct Framebuffer {
    width:  usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Framebuffer {
            width,
            height,
            pixels: vec![Rgba::BLACK.to_argb(); width * height],
        }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn pixels(&self) -> &[u32] { &self.pixels }

    /// Reallocate for a new surface size.  Previous contents are discarded.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![Rgba::BLACK.to_argb(); width * height];
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color.with_alpha(1.0).to_argb());
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// Source-over blend of `color` scaled by `coverage` into one pixel.
    fn blend(&mut self, x: i64, y: i64, color: Rgba, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let a = (color.a * coverage).clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        let dst = Rgba::from_argb(self.pixels[idx]);
        let mix = |s: f32, d: f32| s * a + d * (1.0 - a);
        self.pixels[idx] = Rgba::new(
            mix(color.r, dst.r),
            mix(color.g, dst.g),
            mix(color.b, dst.b),
            1.0,
        )
        .to_argb();
    }

    /// Clip a float span `[lo, hi]` to pixel indices inside `0..limit`.
    fn clip_span(lo: f32, hi: f32, limit: usize) -> Option<(i64, i64)> {
        let lo = lo.floor().max(0.0) as i64;
        let hi = (hi.ceil() as i64).min(limit as i64 - 1);
        if lo > hi { None } else { Some((lo, hi)) }
    }
}

impl Canvas for Framebuffer {
    fn fill_surface(&mut self, color: Rgba) {
        if color.a >= 1.0 {
            self.clear(color);
            return;
        }
        for y in 0..self.height as i64 {
            for x in 0..self.width as i64 {
                self.blend(x, y, color, 1.0);
            }
        }
    }

    /// Major-axis span rasterizer: each pixel of the stroke is blended once,
    /// so translucent lines do not darken where stamps would overlap.
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        if !from.is_finite() || !to.is_finite() {
            return;
        }
        let (lo, hi) = (from.min(to), from.max(to));
        let pad = width + 1.0;
        if hi.x + pad < 0.0 || hi.y + pad < 0.0
            || lo.x - pad >= self.width as f32 || lo.y - pad >= self.height as f32
        {
            return;
        }
        let d = to - from;
        let len = d.length();
        let coverage = width.min(1.0);
        if len < 0.5 {
            self.fill_circle(from, (width * 0.5).max(0.5), color);
            return;
        }
        let half = (width * 0.5).max(0.5);
        let x_major = d.x.abs() >= d.y.abs();
        let (major_len, minor_half) = if x_major {
            (d.x.abs(), half * len / d.x.abs())
        } else {
            (d.y.abs(), half * len / d.y.abs())
        };
        let steps = major_len.ceil() as i64;
        for i in 0..=steps {
            let t = i as f32 / steps.max(1) as f32;
            let p = from + d * t;
            if x_major {
                let x = p.x.round() as i64;
                let y0 = (p.y - minor_half + 0.5).floor() as i64;
                let y1 = (p.y + minor_half - 0.5).ceil() as i64;
                for y in y0..=y1.max(y0) {
                    self.blend(x, y, color, coverage);
                }
            } else {
                let y = p.y.round() as i64;
                let x0 = (p.x - minor_half + 0.5).floor() as i64;
                let x1 = (p.x + minor_half - 0.5).ceil() as i64;
                for x in x0..=x1.max(x0) {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if !center.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return;
        }
        let Some((x0, x1)) = Self::clip_span(center.x - radius - 1.0, center.x + radius + 1.0, self.width) else { return };
        let Some((y0, y1)) = Self::clip_span(center.y - radius - 1.0, center.y + radius + 1.0, self.height) else { return };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let coverage = (radius + 0.5 - p.distance(center)).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }

    /// Rows are scanned only across the annulus, not the whole bounding box;
    /// note-trigger rings grow to 200 px.
    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba) {
        if !center.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return;
        }
        let half = (width * 0.5).max(0.5);
        let outer = radius + half + 1.0;
        let inner = (radius - half - 1.0).max(0.0);
        let Some((y0, y1)) = Self::clip_span(center.y - outer, center.y + outer, self.height) else { return };

        for y in y0..=y1 {
            let dy = (y as f32 + 0.5 - center.y).abs();
            if dy > outer {
                continue;
            }
            let xo = (outer * outer - dy * dy).sqrt();
            let spans = if dy < inner {
                let xi = (inner * inner - dy * dy).sqrt();
                [(center.x - xo, center.x - xi), (center.x + xi, center.x + xo)]
            } else {
                // Row passes above the hole: one span, and the second is empty.
                [(center.x - xo, center.x + xo), (1.0, 0.0)]
            };
            for (lo, hi) in spans {
                let Some((x0, x1)) = Self::clip_span(lo, hi, self.width) else { continue };
                for x in x0..=x1 {
                    let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    let ring = (p.distance(center) - radius).abs();
                    let coverage = (half + 0.5 - ring).clamp(0.0, 1.0);
                    if coverage > 0.0 {
                        self.blend(x, y, color, coverage);
                    }
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DrawRecorder (headless canvas)
// ════════════════════════════════════════════════════════════════════════════

/// One recorded primitive.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    FillSurface { color: Rgba },
    Line { from: Vec2, to: Vec2, width: f32, color: Rgba },
    Circle { center: Vec2, radius: f32, color: Rgba },
    Ring { center: Vec2, radius: f32, width: f32, color: Rgba },
}

/// Canvas that records commands instead of rasterizing them.
#[derive(Debug, Default)]
pub struct DrawRecorder {
    pub commands: Vec<DrawCommand>,
}

impl DrawRecorder {
    pub fn clear(&mut self) { self.commands.clear(); }

    pub fn lines(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| matches!(c, DrawCommand::Line { .. }))
    }

    pub fn rings(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| matches!(c, DrawCommand::Ring { .. }))
    }
}

impl Canvas for DrawRecorder {
    fn fill_surface(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::FillSurface { color });
    }
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.commands.push(DrawCommand::Line { from, to, width, color });
    }
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle { center, radius, color });
    }
    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba) {
        self.commands.push(DrawCommand::Ring { center, radius, width, color });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);

    #[test]
    fn transparent_fill_leaves_pixels() {
        let mut fb = Framebuffer::new(4, 4);
        fb.clear(Rgba::WHITE);
        fb.fill_surface(RED.with_alpha(0.0));
        assert!(fb.pixels().iter().all(|&p| p == 0xFFFFFFFF));
    }

    #[test]
    fn opaque_fill_replaces_pixels() {
        let mut fb = Framebuffer::new(4, 4);
        fb.fill_surface(RED);
        assert!(fb.pixels().iter().all(|&p| p == 0xFFFF0000));
    }

    #[test]
    fn half_alpha_fill_mixes() {
        let mut fb = Framebuffer::new(1, 1);
        fb.fill_surface(Rgba::WHITE.with_alpha(0.5));
        let c = Rgba::from_argb(fb.pixels()[0]);
        assert!((c.r - 0.5).abs() < 0.01);
        assert_eq!(fb.pixels()[0] >> 24, 0xFF, "framebuffer stays opaque");
    }

    #[test]
    fn horizontal_line_covers_its_row() {
        let mut fb = Framebuffer::new(20, 5);
        fb.stroke_line(Vec2::new(2.0, 2.0), Vec2::new(17.0, 2.0), 1.0, RED);
        for x in 2..=17 {
            assert_eq!(fb.pixel(x, 2), Some(0xFFFF0000), "x = {}", x);
        }
        assert_eq!(fb.pixel(10, 4), Some(0xFF000000));
    }

    #[test]
    fn offscreen_primitives_are_clipped() {
        let mut fb = Framebuffer::new(8, 8);
        fb.stroke_line(Vec2::new(-50.0, -50.0), Vec2::new(-10.0, -5.0), 3.0, RED);
        fb.fill_circle(Vec2::new(100.0, 100.0), 5.0, RED);
        fb.stroke_circle(Vec2::new(-300.0, 4.0), 200.0, 2.0, RED);
        assert!(fb.pixels().iter().all(|&p| p == 0xFF000000));
    }

    #[test]
    fn non_finite_geometry_is_ignored() {
        let mut fb = Framebuffer::new(8, 8);
        fb.stroke_line(Vec2::new(f32::NAN, 0.0), Vec2::new(4.0, 4.0), 1.0, RED);
        fb.fill_circle(Vec2::new(4.0, 4.0), f32::INFINITY, RED);
        assert!(fb.pixels().iter().all(|&p| p == 0xFF000000));
    }

    #[test]
    fn ring_leaves_centre_untouched() {
        let mut fb = Framebuffer::new(64, 64);
        fb.stroke_circle(Vec2::new(32.0, 32.0), 20.0, 2.0, RED);
        assert_eq!(fb.pixel(32, 32), Some(0xFF000000));
        let on_ring = Rgba::from_argb(fb.pixel(51, 31).unwrap());
        assert!(on_ring.r > 0.9, "ring pixel r = {}", on_ring.r);
    }

    #[test]
    fn recorder_keeps_order() {
        let mut rec = DrawRecorder::default();
        rec.fill_surface(Rgba::BLACK);
        rec.stroke_circle(Vec2::ZERO, 3.0, 1.0, RED);
        assert!(matches!(rec.commands[0], DrawCommand::FillSurface { .. }));
        assert_eq!(rec.rings().count(), 1);
    }
}
