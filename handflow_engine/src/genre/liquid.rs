//! Liquid: a fluid, ethereal flow field.
//!
//! Particles drift along a slowly evolving noise field.  Hands pull nearby
//! particles in; fast hand motion drags them along its direction and
//! stirs in turbulence.  Each particle renders as a streak from its previous
//! position, coloured by speed: cool violet when calm, running hot toward
//! orange/white as it approaches its top speed.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use super::{FrameContext, TrackedHand};
use crate::canvas::Canvas;
use crate::color::{hsla, Rgba};
use crate::noise::value_noise;

pub const PARTICLE_COUNT: usize = 350;

const NOISE_SCALE:        f32 = 0.003;
const NOISE_TIME_SCALE:   f32 = 0.004;
const FLOW_FORCE:         f32 = 0.06;

const ATTRACT_RADIUS:     f32 = 220.0;
const ATTRACT_FORCE:      f32 = 0.55;
/// Hand speed (px/frame) above which drag and turbulence kick in.
const DRAG_SPEED_MIN:     f32 = 2.0;
const DRAG_GAIN:          f32 = 2.5;
const DRAG_MAX:           f32 = 1.5;
const TURBULENCE:         f32 = 0.25;

const MAX_SPEED_MIN:      f32 = 2.0;
const MAX_SPEED_MAX:      f32 = 5.0;
const DAMPING:            f32 = 0.96;

/// Normalized speed where the palette switches from cool to hot.
const HOT_THRESHOLD:      f32 = 0.3;
/// Wrapping to the far edge lands this far inside it, keeping x < width.
const EDGE_INSET:         f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LiquidParticle {
    pub position:     Vec2,
    pub previous:     Vec2,
    pub velocity:     Vec2,
    pub acceleration: Vec2,
    pub max_speed:    f32,
}

pub struct LiquidSystem {
    particles: Box<[LiquidParticle]>,
    width:     f32,
    height:    f32,
    rng:       SmallRng,
}

impl LiquidSystem {
    pub fn new(width: f32, height: f32, mut rng: SmallRng) -> Self {
        let particles = (0..PARTICLE_COUNT)
            .map(|_| {
                let position = Vec2::new(
                    rng.gen_range(0.0..width.max(1.0)),
                    rng.gen_range(0.0..height.max(1.0)),
                );
                LiquidParticle {
                    position,
                    previous:     position,
                    velocity:     Vec2::ZERO,
                    acceleration: Vec2::ZERO,
                    max_speed:    rng.gen_range(MAX_SPEED_MIN..MAX_SPEED_MAX),
                }
            })
            .collect();
        LiquidSystem { particles, width, height, rng }
    }

    pub fn particles(&self) -> &[LiquidParticle] {
        &self.particles
    }

    pub fn update(&mut self, ctx: &FrameContext) {
        let t = ctx.frame as f32 * NOISE_TIME_SCALE;
        let (w, h) = (self.width, self.height);
        for p in self.particles.iter_mut() {
            p.acceleration += flow_force(p.position, t);
            for hand in ctx.hands {
                p.acceleration += hand_force(p.position, hand, &mut self.rng);
            }
            integrate(p);
            wrap(p, w, h);
        }
    }

    pub fn render(&self, canvas: &mut dyn Canvas, _ctx: &FrameContext) {
        for p in self.particles.iter() {
            let style = streak_style(normalized_speed(p));
            canvas.stroke_line(p.previous, p.position, style.width, style.color);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Forces
// ════════════════════════════════════════════════════════════════════════════

fn flow_force(position: Vec2, t: f32) -> Vec2 {
    let n = value_noise(position.x * NOISE_SCALE, position.y * NOISE_SCALE, t);
    Vec2::from_angle(n * TAU * 2.0) * FLOW_FORCE
}

/// Attraction inside the radius plus, for a fast hand, drag along its motion
/// and a turbulence kick.  Degenerate geometry contributes nothing.
fn hand_force(position: Vec2, hand: &TrackedHand, rng: &mut SmallRng) -> Vec2 {
    let to_hand = hand.position - position;
    let d = to_hand.length();
    if !(d > 0.0 && d < ATTRACT_RADIUS) {
        return Vec2::ZERO;
    }
    let mut force = Vec2::ZERO;
    if let Some(dir) = to_hand.try_normalize() {
        force += dir * ATTRACT_FORCE * (1.0 - d / ATTRACT_RADIUS);
    }

    let speed = hand.velocity.length();
    if speed > DRAG_SPEED_MIN {
        if let Some(dir) = hand.velocity.try_normalize() {
            let magnitude = (speed * DRAG_GAIN / d).min(DRAG_MAX);
            force += dir * magnitude;
        }
        force += Vec2::new(
            rng.gen_range(-TURBULENCE..=TURBULENCE),
            rng.gen_range(-TURBULENCE..=TURBULENCE),
        );
    }
    if force.is_finite() { force } else { Vec2::ZERO }
}

fn integrate(p: &mut LiquidParticle) {
    p.previous = p.position;
    p.velocity = (p.velocity + p.acceleration).clamp_length_max(p.max_speed) * DAMPING;
    if !p.velocity.is_finite() {
        p.velocity = Vec2::ZERO;
    }
    p.position += p.velocity;
    p.acceleration = Vec2::ZERO;
}

/// Toroidal wrap.  A wrapped particle's streak restarts at its new position.
fn wrap(p: &mut LiquidParticle, width: f32, height: f32) {
    let mut wrapped = false;
    if p.position.x >= width {
        p.position.x = 0.0;
        wrapped = true;
    } else if p.position.x < 0.0 {
        p.position.x = (width - EDGE_INSET).max(0.0);
        wrapped = true;
    }
    if p.position.y >= height {
        p.position.y = 0.0;
        wrapped = true;
    } else if p.position.y < 0.0 {
        p.position.y = (height - EDGE_INSET).max(0.0);
        wrapped = true;
    }
    if wrapped {
        p.previous = p.position;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Colour
// ════════════════════════════════════════════════════════════════════════════

fn normalized_speed(p: &LiquidParticle) -> f32 {
    (p.velocity.length() / (0.8 * p.max_speed)).clamp(0.0, 1.0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreakStyle {
    pub color: Rgba,
    pub width: f32,
}

/// Two-regime palette over normalized speed `s` (0–1).
///
/// * `s < 0.3`: hue 230→280, dim and translucent.
/// * `s ≥ 0.3`: hue 280→400 (wraps into orange), saturation falling while
///   lightness and alpha climb.
pub fn streak_style(s: f32) -> StreakStyle {
    let s = s.clamp(0.0, 1.0);
    let color = if s < HOT_THRESHOLD {
        let t = s / HOT_THRESHOLD;
        hsla(230.0 + 50.0 * t, 0.8, 0.45 + 0.10 * t, 0.25 + 0.20 * t)
    } else {
        let t = (s - HOT_THRESHOLD) / (1.0 - HOT_THRESHOLD);
        hsla(280.0 + 120.0 * t, 0.85 - 0.40 * t, 0.55 + 0.30 * t, 0.45 + 0.50 * t)
    };
    StreakStyle { color, width: 1.0 + 2.5 * s }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::Side;
    use rand::SeedableRng;

    const W: f32 = 800.0;
    const H: f32 = 600.0;

    fn system() -> LiquidSystem {
        LiquidSystem::new(W, H, SmallRng::seed_from_u64(42))
    }

    fn ctx(hands: &[TrackedHand], frame: u64) -> FrameContext<'_> {
        FrameContext { hands, flash: 0.0, hue: 0.0, frame, width: W, height: H }
    }

    fn still(p: Vec2) -> LiquidParticle {
        LiquidParticle {
            position: p,
            previous: p,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            max_speed: 4.0,
        }
    }

    #[test]
    fn population_is_fixed() {
        let mut sys = system();
        for f in 0..10 { sys.update(&ctx(&[], f)); }
        assert_eq!(sys.particles().len(), PARTICLE_COUNT);
    }

    #[test]
    fn wraps_past_right_edge_without_streak() {
        let mut sys = system();
        sys.particles[0] = still(Vec2::new(W + 0.5, 300.0));
        sys.update(&ctx(&[], 0));
        let p = sys.particles[0];
        assert!(p.position.x.abs() < 1e-3, "x = {}", p.position.x);
        assert_eq!(p.previous, p.position);
    }

    #[test]
    fn wraps_past_left_and_bottom_edges() {
        let mut sys = system();
        sys.particles[0] = still(Vec2::new(-0.5, H + 1.0));
        sys.update(&ctx(&[], 0));
        let p = sys.particles[0];
        assert!(p.position.x < W && p.position.x > W - 1.0);
        assert_eq!(p.position.y, 0.0);
        assert_eq!(p.previous, p.position);
    }

    #[test]
    fn hand_attracts_nearby_particles() {
        let hand = TrackedHand {
            side: Side::Right,
            position: Vec2::new(400.0, 300.0),
            velocity: Vec2::ZERO,
            squeeze: 0.0,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let f = hand_force(Vec2::new(300.0, 300.0), &hand, &mut rng);
        assert!(f.x > 0.0 && f.y.abs() < 1e-6);

        let far = hand_force(Vec2::new(0.0, 0.0), &hand, &mut rng);
        assert_eq!(far, Vec2::ZERO);
    }

    #[test]
    fn attraction_falls_off_linearly() {
        let hand = TrackedHand {
            side: Side::Left,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            squeeze: 0.0,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let near = hand_force(Vec2::new(10.0, 0.0), &hand, &mut rng).length();
        let mid = hand_force(Vec2::new(110.0, 0.0), &hand, &mut rng).length();
        assert!(near > mid);
        assert!((mid - ATTRACT_FORCE * 0.5).abs() < 1e-4);
    }

    #[test]
    fn fast_hand_drags_along_its_motion() {
        let hand = TrackedHand {
            side: Side::Right,
            position: Vec2::new(100.0, 100.0),
            velocity: Vec2::new(0.0, 20.0),
            squeeze: 0.0,
        };
        let mut rng = SmallRng::seed_from_u64(3);
        // Particle directly below the hand: attraction points up, drag down.
        let f = hand_force(Vec2::new(100.0, 105.0), &hand, &mut rng);
        assert!(f.y > 0.0, "drag should dominate close to a fast hand: {:?}", f);
    }

    #[test]
    fn coincident_hand_contributes_nothing() {
        let hand = TrackedHand {
            side: Side::Right,
            position: Vec2::new(50.0, 50.0),
            velocity: Vec2::new(30.0, 0.0),
            squeeze: 1.0,
        };
        let mut rng = SmallRng::seed_from_u64(5);
        assert_eq!(hand_force(Vec2::new(50.0, 50.0), &hand, &mut rng), Vec2::ZERO);
    }

    #[test]
    fn speed_is_clamped_to_max() {
        let mut p = still(Vec2::new(10.0, 10.0));
        p.acceleration = Vec2::new(100.0, 0.0);
        integrate(&mut p);
        assert!(p.velocity.length() <= p.max_speed * DAMPING + 1e-4);
    }

    #[test]
    fn palette_regimes() {
        let calm = streak_style(0.0);
        let edge = streak_style(0.29);
        let hot = streak_style(1.0);
        assert!(calm.color.a < edge.color.a);
        assert!(edge.color.a < hot.color.a);
        assert!(calm.width < hot.width);
        // Hot end wraps to hue 40°, an orange, red-dominant colour.
        assert!(hot.color.r > hot.color.g && hot.color.g > hot.color.b);
        // Calm end sits in the blues.
        assert!(calm.color.b > calm.color.r);
    }

    #[test]
    fn streak_runs_from_previous_to_current() {
        use crate::canvas::{DrawCommand, DrawRecorder};
        let mut sys = system();
        sys.update(&ctx(&[], 0));
        let mut rec = DrawRecorder::default();
        sys.render(&mut rec, &ctx(&[], 0));
        assert_eq!(rec.lines().count(), PARTICLE_COUNT);
        match &rec.commands[0] {
            DrawCommand::Line { from, to, .. } => {
                assert_eq!(*from, sys.particles[0].previous);
                assert_eq!(*to, sys.particles[0].position);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
