//! Genre particle systems.
//!
//! A session runs exactly one genre.  [`GenreSystem`] is the closed set of
//! simulations; `update` and `render` dispatch with a single `match`, and
//! each variant stores its particles in a fixed-length boxed slice that is
//! only ever rebuilt wholesale (session start, surface resize).

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::color::{hsla, Rgba};
use crate::hand::Side;

pub mod liquid;
pub mod neural;
pub mod vortex;

pub use liquid::LiquidSystem;
pub use neural::NeuralGrid;
pub use vortex::VortexSystem;

// ════════════════════════════════════════════════════════════════════════════
// Genre
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    /// Fluid, ethereal flow field.
    #[default]
    Liquid,
    /// Tunnel streaming toward the viewer.
    Vortex,
    /// Connected-node grid.
    Neural,
}

impl Genre {
    pub const ALL: [Genre; 3] = [Genre::Liquid, Genre::Vortex, Genre::Neural];

    pub fn name(self) -> &'static str {
        match self {
            Genre::Liquid => "liquid",
            Genre::Vortex => "vortex",
            Genre::Neural => "neural",
        }
    }

    /// Fixed population for a session of this genre.
    pub fn particle_count(self) -> usize {
        match self {
            Genre::Liquid => liquid::PARTICLE_COUNT,
            Genre::Vortex => vortex::PARTICLE_COUNT,
            Genre::Neural => neural::NODE_COUNT,
        }
    }

    pub fn style(self) -> GenreStyle {
        match self {
            Genre::Liquid => GenreStyle {
                background: Rgba::new(0.02, 0.02, 0.07, 1.0),
                flash_tint: hsla(255.0, 0.6, 0.35, 1.0),
                fade_alpha: 0.08,
                ring:       hsla(200.0, 0.8, 0.75, 0.9),
            },
            Genre::Vortex => GenreStyle {
                background: Rgba::new(0.0, 0.0, 0.0, 1.0),
                flash_tint: hsla(330.0, 0.7, 0.3, 1.0),
                fade_alpha: 0.18,
                ring:       hsla(50.0, 0.9, 0.7, 0.9),
            },
            Genre::Neural => GenreStyle {
                background: Rgba::new(0.01, 0.03, 0.04, 1.0),
                flash_tint: hsla(185.0, 0.7, 0.3, 1.0),
                fade_alpha: 0.22,
                ring:       hsla(305.0, 0.8, 0.7, 0.9),
            },
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown genre '{}' (expected liquid, vortex or neural)", s))
    }
}

/// Per-genre palette for the trail fade and note rings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenreStyle {
    pub background: Rgba,
    pub flash_tint: Rgba,
    /// Base alpha of the per-tick trail fade.
    pub fade_alpha: f32,
    pub ring:       Rgba,
}

// ════════════════════════════════════════════════════════════════════════════
// FrameContext: what a genre system sees each tick
// ════════════════════════════════════════════════════════════════════════════

/// A present hand in surface pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedHand {
    pub side:     Side,
    pub position: Vec2,
    /// Pixels moved since the previous tick; zero on the first tick seen.
    pub velocity: Vec2,
    pub squeeze:  f32,
}

#[derive(Clone, Copy, Debug)]
pub struct FrameContext<'a> {
    /// Present hands only (zero, one or two).
    pub hands:  &'a [TrackedHand],
    /// Beat flash intensity 0–1.
    pub flash:  f32,
    /// Global hue in degrees.
    pub hue:    f32,
    pub frame:  u64,
    pub width:  f32,
    pub height: f32,
}

impl FrameContext<'_> {
    pub fn any_hand(&self) -> bool {
        !self.hands.is_empty()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GenreSystem dispatch
// ════════════════════════════════════════════════════════════════════════════

pub enum GenreSystem {
    Liquid(LiquidSystem),
    Vortex(VortexSystem),
    Neural(NeuralGrid),
}

impl GenreSystem {
    /// Seed a full population from OS entropy.
    pub fn new(genre: Genre, width: f32, height: f32) -> Self {
        Self::with_rng(genre, width, height, SmallRng::from_entropy())
    }

    pub fn with_rng(genre: Genre, width: f32, height: f32, rng: SmallRng) -> Self {
        match genre {
            Genre::Liquid => GenreSystem::Liquid(LiquidSystem::new(width, height, rng)),
            Genre::Vortex => GenreSystem::Vortex(VortexSystem::new(width, height, rng)),
            Genre::Neural => GenreSystem::Neural(NeuralGrid::new(width, height, rng)),
        }
    }

    pub fn genre(&self) -> Genre {
        match self {
            GenreSystem::Liquid(_) => Genre::Liquid,
            GenreSystem::Vortex(_) => Genre::Vortex,
            GenreSystem::Neural(_) => Genre::Neural,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            GenreSystem::Liquid(s) => s.particles().len(),
            GenreSystem::Vortex(s) => s.particles().len(),
            GenreSystem::Neural(s) => s.nodes().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn update(&mut self, ctx: &FrameContext) {
        match self {
            GenreSystem::Liquid(s) => s.update(ctx),
            GenreSystem::Vortex(s) => s.update(ctx),
            GenreSystem::Neural(s) => s.update(ctx),
        }
    }

    pub fn render(&self, canvas: &mut dyn Canvas, ctx: &FrameContext) {
        match self {
            GenreSystem::Liquid(s) => s.render(canvas, ctx),
            GenreSystem::Vortex(s) => s.render(canvas, ctx),
            GenreSystem::Neural(s) => s.render(canvas, ctx),
        }
    }
}
