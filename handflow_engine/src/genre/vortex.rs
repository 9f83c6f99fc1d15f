//! Vortex: a tunnel of points streaming toward the viewer.
//!
//! Each particle is a planar offset at some depth.  Depth shrinks every tick
//! (faster while a beat flash is lit) and a particle that reaches the
//! viewer respawns far away.  The whole tunnel spins; a present hand spins
//! it faster.

use std::ops::Range;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use super::FrameContext;
use crate::canvas::Canvas;
use crate::color::hsla;

pub const PARTICLE_COUNT: usize = 300;

pub const MIN_DEPTH:    f32 = 1.0;
pub const FAR_DEPTH:    Range<f32> = 1000.0..2000.0;
/// Planar offsets are drawn from `[-OFFSET_RANGE, OFFSET_RANGE]` on both axes.
pub const OFFSET_RANGE: f32 = 1000.0;
const SPEED_RANGE:      Range<f32> = 4.0..14.0;
/// Extra depth per tick at full flash.
const FLASH_BOOST:      f32 = 50.0;

const SPIN_IDLE:        f32 = 0.003;
const SPIN_WITH_HANDS:  f32 = 0.012;
const TWIST_PER_DEPTH:  f32 = 0.0015;

const HUE_PER_DEPTH:    f32 = 0.1;
const HUE_PER_OFFSET:   f32 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VortexParticle {
    pub offset: Vec2,
    pub depth:  f32,
    pub speed:  f32,
}

pub struct VortexSystem {
    particles: Box<[VortexParticle]>,
    spin:      f32,
    width:     f32,
    height:    f32,
    rng:       SmallRng,
}

impl VortexSystem {
    /// The initial population is spread over the whole tunnel so it starts
    /// full instead of arriving as one wave.
    pub fn new(width: f32, height: f32, mut rng: SmallRng) -> Self {
        let particles = (0..PARTICLE_COUNT)
            .map(|_| {
                let mut p = spawn(&mut rng);
                p.depth = rng.gen_range(MIN_DEPTH..FAR_DEPTH.end);
                p
            })
            .collect();
        VortexSystem { particles, spin: 0.0, width, height, rng }
    }

    pub fn particles(&self) -> &[VortexParticle] {
        &self.particles
    }

    pub fn spin(&self) -> f32 {
        self.spin
    }

    pub fn update(&mut self, ctx: &FrameContext) {
        self.spin += if ctx.any_hand() { SPIN_WITH_HANDS } else { SPIN_IDLE };
        let boost = ctx.flash * FLASH_BOOST;
        for p in self.particles.iter_mut() {
            p.depth -= p.speed + boost;
            if p.depth <= MIN_DEPTH {
                *p = spawn(&mut self.rng);
            }
        }
    }

    pub fn render(&self, canvas: &mut dyn Canvas, ctx: &FrameContext) {
        for p in self.particles.iter() {
            let Some(screen) = self.project(p) else { continue };
            let nearness = (1.0 - p.depth / FAR_DEPTH.end).clamp(0.0, 1.0);
            let radius = 0.5 + 4.5 * nearness;
            canvas.fill_circle(screen, radius, hsla(particle_hue(ctx.hue, p), 0.85, 0.6, nearness));
        }
    }

    /// Perspective projection onto the surface, or `None` when the point
    /// lands off-screen.
    pub fn project(&self, p: &VortexParticle) -> Option<Vec2> {
        let angle = self.spin + p.depth * TWIST_PER_DEPTH;
        let rotated = Vec2::from_angle(angle).rotate(p.offset);
        let half = Vec2::new(self.width, self.height) * 0.5;
        let screen = rotated / p.depth * half + half;
        let inside = screen.is_finite()
            && (0.0..self.width).contains(&screen.x)
            && (0.0..self.height).contains(&screen.y);
        inside.then_some(screen)
    }
}

/// Global hue shifted by depth and horizontal offset, in degrees mod 360.
pub fn particle_hue(global: f32, p: &VortexParticle) -> f32 {
    (global + p.depth * HUE_PER_DEPTH + p.offset.x * HUE_PER_OFFSET).rem_euclid(360.0)
}

fn spawn(rng: &mut SmallRng) -> VortexParticle {
    VortexParticle {
        offset: Vec2::new(
            rng.gen_range(-OFFSET_RANGE..=OFFSET_RANGE),
            rng.gen_range(-OFFSET_RANGE..=OFFSET_RANGE),
        ),
        depth: rng.gen_range(FAR_DEPTH),
        speed: rng.gen_range(SPEED_RANGE),
    }
}
