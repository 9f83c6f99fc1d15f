//! Frame orchestrator: one render tick for the active genre.
//!
//! ```text
//!  FrameInput ─► notes ─► hands (px + velocity) ─► flash ─► trail fade
//!                                                            │
//!      hue ◄── frame++ ◄── genre update + render ◄── note rings
//! ```
//!
//! Owns all render state.  Nothing here blocks or fails.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::canvas::Canvas;
use crate::genre::{FrameContext, Genre, GenreStyle, GenreSystem, TrackedHand};
use crate::hand::{HandState, Side};
use crate::input::FrameInput;
use crate::overlay::{BackgroundFade, EventOverlay};

/// Degrees of hue advanced per frame.
pub const HUE_RATE: f32 = 0.3;

pub struct FrameOrchestrator {
    genre:     Genre,
    style:     GenreStyle,
    system:    GenreSystem,
    overlay:   EventOverlay,
    hands:     HandState,
    previous:  [Option<Vec2>; 2],
    frame:     u64,
    hue:       f32,
    width:     f32,
    height:    f32,
    last_fade: Option<BackgroundFade>,
    /// Seeds each rebuilt population.
    seeder:    SmallRng,
}

impl FrameOrchestrator {
    pub fn new(genre: Genre, width: f32, height: f32) -> Self {
        Self::from_seeder(genre, width, height, SmallRng::from_entropy())
    }

    /// Deterministic populations, for tests and replays.
    pub fn with_seed(genre: Genre, width: f32, height: f32, seed: u64) -> Self {
        Self::from_seeder(genre, width, height, SmallRng::seed_from_u64(seed))
    }

    fn from_seeder(genre: Genre, width: f32, height: f32, mut seeder: SmallRng) -> Self {
        let system = GenreSystem::with_rng(genre, width, height, SmallRng::seed_from_u64(seeder.gen()));
        FrameOrchestrator {
            genre,
            style:     genre.style(),
            system,
            overlay:   EventOverlay::default(),
            hands:     HandState::default(),
            previous:  [None; 2],
            frame:     0,
            hue:       0.0,
            width,
            height,
            last_fade: None,
            seeder,
        }
    }

    pub fn genre(&self) -> Genre { self.genre }
    pub fn system(&self) -> &GenreSystem { &self.system }
    pub fn overlay(&self) -> &EventOverlay { &self.overlay }
    pub fn hands(&self) -> &HandState { &self.hands }
    pub fn frame(&self) -> u64 { self.frame }
    pub fn hue(&self) -> f32 { self.hue }
    pub fn size(&self) -> (f32, f32) { (self.width, self.height) }
    pub fn last_fade(&self) -> Option<BackgroundFade> { self.last_fade }

    /// Rebuild the population for a new surface size.  Overlay state, the
    /// hand snapshot and the frame counter survive; stale previous
    /// positions do not.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.previous = [None; 2];
        let rng = SmallRng::seed_from_u64(self.seeder.gen());
        self.system = GenreSystem::with_rng(self.genre, width, height, rng);
    }

    /// Run one frame against `canvas` and report the trail fade used.
    pub fn tick(&mut self, input: FrameInput, canvas: &mut dyn Canvas) -> BackgroundFade {
        for (x, y) in input.notes {
            self.overlay.push_note(x, y);
        }
        if let Some(state) = input.hands {
            self.hands = state;
        }
        let tracked = self.track_hands();

        self.overlay.step_flash(input.beat);
        let fade = BackgroundFade::for_flash(self.overlay.flash(), &self.style);
        canvas.fill_surface(fade.color());

        self.overlay.render_notes(canvas, self.width, self.height, self.style.ring);

        let ctx = FrameContext {
            hands:  &tracked,
            flash:  self.overlay.flash().intensity(),
            hue:    self.hue,
            frame:  self.frame,
            width:  self.width,
            height: self.height,
        };
        self.system.update(&ctx);
        self.system.render(canvas, &ctx);

        self.frame += 1;
        self.hue = (self.frame as f32 * HUE_RATE) % 360.0;
        self.last_fade = Some(fade);
        log::trace!("frame {} fade {:?}", self.frame, fade);
        fade
    }

    /// Present hands in pixels, with velocity against the previous tick.
    fn track_hands(&mut self) -> Vec<TrackedHand> {
        let size = Vec2::new(self.width, self.height);
        let mut tracked = Vec::with_capacity(2);
        for side in Side::BOTH {
            let slot = &mut self.previous[side.index()];
            let Some(coords) = self.hands.hand(side) else {
                *slot = None;
                continue;
            };
            let position = Vec2::new(coords.x, coords.y) * size;
            let velocity = slot.map_or(Vec2::ZERO, |prev| position - prev);
            *slot = Some(position);
            tracked.push(TrackedHand { side, position, velocity, squeeze: self.hands.squeeze(side) });
        }
        tracked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCommand, DrawRecorder};
    use crate::hand::HandCoordinates;

    fn orchestrator(genre: Genre) -> FrameOrchestrator {
        FrameOrchestrator::with_seed(genre, 800.0, 600.0, 42)
    }

    fn right_hand_at(x: f32, y: f32) -> HandState {
        HandState {
            right: Some(HandCoordinates { x, y, z: 0.0 }),
            right_squeeze: 0.4,
            ..HandState::default()
        }
    }

    #[test]
    fn fade_is_drawn_first() {
        let mut orch = orchestrator(Genre::Neural);
        let mut rec = DrawRecorder::default();
        let fade = orch.tick(FrameInput::default(), &mut rec);
        assert_eq!(rec.commands.first(), Some(&DrawCommand::FillSurface { color: fade.color() }));
        assert!(fade.is_plain());
    }

    #[test]
    fn beat_lights_the_fade() {
        let mut orch = orchestrator(Genre::Vortex);
        let mut rec = DrawRecorder::default();
        let input = FrameInput { beat: true, ..FrameInput::default() };
        let fade = orch.tick(input, &mut rec);
        match fade {
            BackgroundFade::Flash { intensity, color } => {
                assert_eq!(intensity, 1.0);
                assert!((color.a - (0.18 + 0.25)).abs() < 1e-5);
            }
            other => panic!("expected flash fade, got {:?}", other),
        }
    }

    #[test]
    fn hue_follows_frame_count() {
        let mut orch = orchestrator(Genre::Neural);
        let mut rec = DrawRecorder::default();
        for _ in 0..1300 {
            orch.tick(FrameInput::default(), &mut rec);
            rec.clear();
        }
        assert_eq!(orch.frame(), 1300);
        assert!((orch.hue() - (1300.0 * 0.3) % 360.0).abs() < 1e-3);
        assert!(orch.hue() < 360.0);
    }

    #[test]
    fn hand_velocity_is_the_pixel_delta() {
        let mut orch = orchestrator(Genre::Liquid);
        let mut rec = DrawRecorder::default();

        let input = FrameInput { hands: Some(right_hand_at(0.5, 0.5)), ..FrameInput::default() };
        orch.tick(input, &mut rec);
        let first = orch.track_hands();
        // Same snapshot again: no movement.
        assert_eq!(first[0].velocity, Vec2::ZERO);

        orch.hands = right_hand_at(0.6, 0.5);
        let moved = orch.track_hands();
        assert_eq!(moved.len(), 1);
        assert!((moved[0].velocity - Vec2::new(80.0, 0.0)).length() < 1e-3);
        assert_eq!(moved[0].side, Side::Right);
    }

    #[test]
    fn snapshot_persists_until_replaced() {
        let mut orch = orchestrator(Genre::Liquid);
        let mut rec = DrawRecorder::default();
        let state = right_hand_at(0.2, 0.3);
        orch.tick(FrameInput { hands: Some(state), ..FrameInput::default() }, &mut rec);
        orch.tick(FrameInput::default(), &mut rec);
        assert_eq!(*orch.hands(), state);

        orch.tick(FrameInput { hands: Some(HandState::default()), ..FrameInput::default() }, &mut rec);
        assert!(!orch.hands().any_present());
        assert_eq!(orch.previous, [None, None]);
    }

    #[test]
    fn notes_render_before_the_genre() {
        let mut orch = orchestrator(Genre::Neural);
        let mut rec = DrawRecorder::default();
        let input = FrameInput { notes: vec![(0.5, 0.5)], ..FrameInput::default() };
        orch.tick(input, &mut rec);
        assert!(matches!(rec.commands[1], DrawCommand::Ring { .. }));
        assert_eq!(rec.rings().count(), 1);
        assert_eq!(orch.overlay().notes().len(), 1);
    }

    #[test]
    fn resize_reseeds_at_same_count() {
        let mut orch = orchestrator(Genre::Vortex);
        let before = orch.system().len();
        orch.resize(320.0, 200.0);
        assert_eq!(orch.system().len(), before);
        assert_eq!(orch.size(), (320.0, 200.0));
    }

    #[test]
    fn seeded_orchestrators_agree() {
        let mut a = orchestrator(Genre::Liquid);
        let mut b = orchestrator(Genre::Liquid);
        let (mut ra, mut rb) = (DrawRecorder::default(), DrawRecorder::default());
        for _ in 0..5 {
            a.tick(FrameInput::default(), &mut ra);
            b.tick(FrameInput::default(), &mut rb);
        }
        assert_eq!(ra.commands, rb.commands);
    }
}
