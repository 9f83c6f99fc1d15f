//! Event overlay: beat flash and note-triggered ring bursts.
//!
//! Both are fed by the audio collaborator (beat → flash reset, note → new
//! trigger) and decayed once per tick by the orchestrator.

use glam::Vec2;

use crate::canvas::Canvas;
use crate::color::Rgba;
use crate::genre::GenreStyle;

/// Per-tick multiplier applied to the flash when no beat arrived.
pub const FLASH_DECAY: f32 = 0.9;
/// Flash at or below this level no longer tints the trail fade.
pub const FLASH_THRESHOLD: f32 = 0.01;
/// Extra fade alpha at full flash, on top of the genre base alpha.
pub const FLASH_ALPHA_GAIN: f32 = 0.25;
/// How far toward the flash tint the fade colour moves at full flash.
pub const FLASH_TINT_GAIN: f32 = 0.6;

pub const NOTE_LIFE_STEP: f32 = 0.05;
/// Ring radius when a trigger's life has fully run out.
pub const NOTE_RING_RADIUS: f32 = 200.0;
pub const NOTE_RING_WIDTH: f32 = 2.0;

// ════════════════════════════════════════════════════════════════════════════
// BeatFlash
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BeatFlash {
    intensity: f32,
}

impl BeatFlash {
    pub fn intensity(&self) -> f32 { self.intensity }

    /// One tick: re-arm to `1.0` on a beat, otherwise decay geometrically.
    pub fn step(&mut self, beat: bool) {
        if beat {
            self.intensity = 1.0;
        } else {
            self.intensity *= FLASH_DECAY;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.intensity > FLASH_THRESHOLD
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Background trail fade
// ════════════════════════════════════════════════════════════════════════════

/// The fill composited over the surface at the start of a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BackgroundFade {
    /// Genre background at its base alpha.
    Plain { color: Rgba },
    /// Background brightened toward the flash tint, with extra alpha.
    Flash { color: Rgba, intensity: f32 },
}

impl BackgroundFade {
    pub fn for_flash(flash: &BeatFlash, style: &GenreStyle) -> Self {
        if flash.is_visible() {
            let f = flash.intensity();
            let color = style
                .background
                .lerp(style.flash_tint, f * FLASH_TINT_GAIN)
                .with_alpha(style.fade_alpha + f * FLASH_ALPHA_GAIN);
            BackgroundFade::Flash { color, intensity: f }
        } else {
            BackgroundFade::Plain { color: style.background.with_alpha(style.fade_alpha) }
        }
    }

    pub fn color(&self) -> Rgba {
        match *self {
            BackgroundFade::Plain { color } | BackgroundFade::Flash { color, .. } => color,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, BackgroundFade::Plain { .. })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NoteTrigger
// ════════════════════════════════════════════════════════════════════════════

/// A positioned burst spawned by an audio note.
///
/// Life is derived from the tick count rather than decremented in place, so
/// `life_k = initial − 0.05·k` holds exactly and a trigger born at `1.0`
/// expires on its 20th tick without float drift.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteTrigger {
    pub x:   f32,
    pub y:   f32,
    initial: f32,
    age:     u32,
}

impl NoteTrigger {
    pub fn new(x: f32, y: f32) -> Self {
        Self::with_life(x, y, 1.0)
    }

    /// `life` is clamped into `(0, 1]`; position into `[0, 1]`.
    pub fn with_life(x: f32, y: f32, life: f32) -> Self {
        NoteTrigger {
            x:       x.clamp(0.0, 1.0),
            y:       y.clamp(0.0, 1.0),
            initial: life.clamp(f32::EPSILON, 1.0),
            age:     0,
        }
    }

    pub fn life(&self) -> f32 {
        self.initial - NOTE_LIFE_STEP * self.age as f32
    }

    pub fn ring_radius(&self) -> f32 {
        (1.0 - self.life()) * NOTE_RING_RADIUS
    }

    pub fn is_expired(&self) -> bool {
        self.life() <= 0.0
    }

    fn age_one_tick(&mut self) {
        self.age += 1;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EventOverlay
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub struct EventOverlay {
    flash: BeatFlash,
    notes: Vec<NoteTrigger>,
}

impl EventOverlay {
    pub fn flash(&self) -> &BeatFlash { &self.flash }
    pub fn notes(&self) -> &[NoteTrigger] { &self.notes }

    pub fn step_flash(&mut self, beat: bool) {
        self.flash.step(beat);
    }

    pub fn push_note(&mut self, x: f32, y: f32) {
        self.notes.push(NoteTrigger::new(x, y));
    }

    /// Draw every live trigger as a ring, then age them and drop the
    /// expired ones.
    pub fn render_notes(&mut self, canvas: &mut dyn Canvas, width: f32, height: f32, ring: Rgba) {
        for note in &self.notes {
            let center = Vec2::new(note.x * width, note.y * height);
            let alpha = ring.a * note.life();
            canvas.stroke_circle(center, note.ring_radius(), NOTE_RING_WIDTH, ring.with_alpha(alpha));
        }
        for note in &mut self.notes {
            note.age_one_tick();
        }
        self.notes.retain(|n| !n.is_expired());
    }
}
