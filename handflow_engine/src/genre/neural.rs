//! Neural grid: drifting nodes wired to their neighbours.
//!
//! Nodes bounce around the surface.  Every pair closer than
//! [`LINK_DISTANCE`] is joined by a line that brightens as the pair closes
//! in, with a data packet sliding along it.  A hand near a node makes it
//! glitch.

use std::f32::consts::TAU;
use std::ops::Range;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use super::FrameContext;
use crate::canvas::Canvas;
use crate::color::hsla;

/// Kept small: links are drawn for every pair, O(n²) per frame.
pub const NODE_COUNT: usize = 80;

pub const LINK_DISTANCE: f32 = 150.0;
const LINK_ALPHA:        f32 = 0.5;
const LINK_WIDTH:        f32 = 1.0;
const PACKET_RATE:       f32 = 0.008;
const PACKET_RADIUS:     f32 = 1.5;

const GLITCH_RADIUS:     f32 = 110.0;
const GLITCH_JITTER:     f32 = 6.0;

const SPEED_RANGE:       Range<f32> = -0.6..0.6;
const BASE_SIZE:         Range<f32> = 2.0..4.0;
const PULSE_RATE:        f32 = 0.06;
const PULSE_DEPTH:       f32 = 1.5;

const HUE_HIGH:          f32 = 185.0;
const HUE_LOW:           f32 = 305.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeuralNode {
    pub position:  Vec2,
    pub velocity:  Vec2,
    pub base_size: f32,
    /// Random identity in `[0, 1)`; picks the node colour and phases.
    pub id:        f32,
}

impl NeuralNode {
    pub fn hue(&self) -> f32 {
        if self.id > 0.5 { HUE_HIGH } else { HUE_LOW }
    }

    pub fn pulse_radius(&self, frame: u64) -> f32 {
        let cycle = (frame as f64 * f64::from(PULSE_RATE)).rem_euclid(std::f64::consts::TAU) as f32;
        let phase = cycle + self.id * TAU;
        (self.base_size + PULSE_DEPTH * phase.sin()).max(0.5)
    }
}

pub struct NeuralGrid {
    nodes:  Box<[NeuralNode]>,
    width:  f32,
    height: f32,
    rng:    SmallRng,
}

impl NeuralGrid {
    pub fn new(width: f32, height: f32, mut rng: SmallRng) -> Self {
        let nodes = (0..NODE_COUNT)
            .map(|_| NeuralNode {
                position:  Vec2::new(
                    rng.gen_range(0.0..width.max(1.0)),
                    rng.gen_range(0.0..height.max(1.0)),
                ),
                velocity:  Vec2::new(rng.gen_range(SPEED_RANGE), rng.gen_range(SPEED_RANGE)),
                base_size: rng.gen_range(BASE_SIZE),
                id:        rng.gen(),
            })
            .collect();
        NeuralGrid { nodes, width, height, rng }
    }

    pub fn nodes(&self) -> &[NeuralNode] {
        &self.nodes
    }

    pub fn update(&mut self, ctx: &FrameContext) {
        let (w, h) = (self.width, self.height);
        for node in self.nodes.iter_mut() {
            node.position += node.velocity;

            let near_hand = ctx
                .hands
                .iter()
                .any(|hand| hand.position.distance(node.position) < GLITCH_RADIUS);
            if near_hand {
                node.position += Vec2::new(
                    self.rng.gen_range(-GLITCH_JITTER..=GLITCH_JITTER),
                    self.rng.gen_range(-GLITCH_JITTER..=GLITCH_JITTER),
                );
            }

            bounce(&mut node.position.x, &mut node.velocity.x, w);
            bounce(&mut node.position.y, &mut node.velocity.y, h);
        }
    }

    pub fn render(&self, canvas: &mut dyn Canvas, ctx: &FrameContext) {
        for (i, a) in self.nodes.iter().enumerate() {
            for b in &self.nodes[i + 1..] {
                let d = a.position.distance(b.position);
                let Some(alpha) = link_alpha(d) else { continue };
                canvas.stroke_line(a.position, b.position, LINK_WIDTH, hsla(a.hue(), 0.7, 0.6, alpha));
                let t = packet_phase(ctx.frame, a.id, b.id);
                let packet = a.position.lerp(b.position, t);
                canvas.fill_circle(packet, PACKET_RADIUS, hsla(b.hue(), 0.4, 0.9, (alpha * 2.0).min(1.0)));
            }
        }
        for node in self.nodes.iter() {
            canvas.fill_circle(node.position, node.pulse_radius(ctx.frame), hsla(node.hue(), 0.9, 0.6, 0.9));
        }
    }
}

/// Invert the velocity component on contact and pull the node back inside.
fn bounce(pos: &mut f32, vel: &mut f32, limit: f32) {
    if *pos < 0.0 {
        *pos = 0.0;
        *vel = -*vel;
    } else if *pos > limit {
        *pos = limit;
        *vel = -*vel;
    }
}

/// Line alpha for a pair at distance `d`, or `None` if they are not linked.
pub fn link_alpha(d: f32) -> Option<f32> {
    (d < LINK_DISTANCE).then(|| LINK_ALPHA * (1.0 - d / LINK_DISTANCE))
}

/// Packet position along a link, in `[0, 1)`.  Stable per edge (both ids)
/// and advancing with the frame count.
pub fn packet_phase(frame: u64, id_a: f32, id_b: f32) -> f32 {
    // Frame term is reduced in f64; f32 stops resolving single frames past 2^24.
    let travel = (frame as f64 * f64::from(PACKET_RATE)).fract() as f32;
    let t = (travel + (id_a + id_b)).fract();
    if t < 1.0 { t } else { 0.0 }
}
