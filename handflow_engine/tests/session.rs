//! End-to-end: a full session driven by scripted collaborators.

use std::sync::{Arc, Mutex};

use handflow_engine::canvas::{DrawRecorder, Framebuffer};
use handflow_engine::genre::{Genre, GenreSystem};
use handflow_engine::hand::{DetectedHand, Landmark, Side, TrackerFrame, LANDMARK_COUNT};
use handflow_engine::input::{AudioEventSender, BeatKind, NoteKind};
use handflow_engine::overlay::BackgroundFade;
use handflow_engine::{AudioEngine, AudioError, EngineConfig, HandTracker, Session, SessionError, TrackerError, TrackerSink};

const W: f32 = 320.0;
const H: f32 = 240.0;

type Calls = Arc<Mutex<Vec<String>>>;

fn record(calls: &Calls, what: impl Into<String>) {
    calls.lock().unwrap().push(what.into());
}

fn count(calls: &Calls, what: &str) -> usize {
    calls.lock().unwrap().iter().filter(|c| *c == what).count()
}

// ── Scripted collaborators ───────────────────────────────────────────────────

struct FakeTracker {
    calls:      Calls,
    sink:       Arc<Mutex<Option<TrackerSink>>>,
    fail_start: bool,
    fail_stop:  bool,
}

impl HandTracker for FakeTracker {
    fn start(&mut self, sink: TrackerSink) -> Result<(), TrackerError> {
        record(&self.calls, "tracker.start");
        if self.fail_start {
            return Err(TrackerError::Unavailable("no camera".into()));
        }
        *self.sink.lock().unwrap() = Some(sink);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TrackerError> {
        record(&self.calls, "tracker.stop");
        if self.fail_stop {
            return Err(TrackerError::Runtime("device vanished".into()));
        }
        Ok(())
    }
}

struct FakeAudio {
    calls:     Calls,
    events:    Arc<Mutex<Option<AudioEventSender>>>,
    updates:   Arc<Mutex<Vec<(Side, bool)>>>,
    fail_load: bool,
}

impl AudioEngine for FakeAudio {
    fn load(&mut self, genre: Genre) -> Result<(), AudioError> {
        record(&self.calls, format!("audio.load {}", genre));
        if self.fail_load {
            return Err(AudioError::Load("missing samples".into()));
        }
        Ok(())
    }

    fn subscribe(&mut self, events: AudioEventSender) {
        record(&self.calls, "audio.subscribe");
        *self.events.lock().unwrap() = Some(events);
    }

    fn update(&mut self, side: Side, _vertical: f32, _horizontal: f32, present: bool, _squeeze: f32) {
        self.updates.lock().unwrap().push((side, present));
    }

    fn stop(&mut self) {
        record(&self.calls, "audio.stop");
    }
}

#[derive(Default)]
struct Rig {
    calls:      Calls,
    sink:       Arc<Mutex<Option<TrackerSink>>>,
    events:     Arc<Mutex<Option<AudioEventSender>>>,
    updates:    Arc<Mutex<Vec<(Side, bool)>>>,
    fail_start: bool,
    fail_stop:  bool,
    fail_load:  bool,
}

impl Rig {
    fn start(&self, genre: Genre) -> Result<Session, SessionError> {
        let config = EngineConfig { genre, ..EngineConfig::default() };
        let tracker = FakeTracker {
            calls:      self.calls.clone(),
            sink:       self.sink.clone(),
            fail_start: self.fail_start,
            fail_stop:  self.fail_stop,
        };
        let audio = FakeAudio {
            calls:     self.calls.clone(),
            events:    self.events.clone(),
            updates:   self.updates.clone(),
            fail_load: self.fail_load,
        };
        Session::start(&config, W, H, Box::new(tracker), Box::new(audio))
    }

    fn sink(&self) -> TrackerSink {
        self.sink.lock().unwrap().clone().unwrap()
    }

    fn events(&self) -> AudioEventSender {
        self.events.lock().unwrap().clone().unwrap()
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn open_hand(side: Side) -> DetectedHand {
    let mut landmarks = vec![Landmark::new(0.5, 0.7, 0.0); LANDMARK_COUNT];
    for tip in [8, 12, 16, 20] {
        landmarks[tip] = Landmark::new(0.5, 0.3, 0.0);
    }
    DetectedHand { side, landmarks }
}

fn last_fade(session: &Session) -> BackgroundFade {
    session.orchestrator().unwrap().last_fade().unwrap()
}

// ── Rendering ────────────────────────────────────────────────────────────────

#[test]
fn liquid_without_hands_stays_in_bounds() {
    let rig = Rig::default();
    let mut session = rig.start(Genre::Liquid).unwrap();
    let mut fb = Framebuffer::new(W as usize, H as usize);
    for _ in 0..100 {
        session.tick(&mut fb).unwrap();
    }
    let GenreSystem::Liquid(liquid) = session.orchestrator().unwrap().system() else {
        panic!("expected the liquid system");
    };
    for p in liquid.particles() {
        assert!(p.position.is_finite() && p.velocity.is_finite());
        assert!((0.0..W).contains(&p.position.x), "x = {}", p.position.x);
        assert!((0.0..H).contains(&p.position.y), "y = {}", p.position.y);
    }
}

#[test]
fn one_beat_then_fifty_ticks_ends_plain() {
    let rig = Rig::default();
    let mut session = rig.start(Genre::Vortex).unwrap();
    let mut canvas = DrawRecorder::default();

    rig.events().beat(BeatKind::Kick);
    session.tick(&mut canvas).unwrap();
    assert!(matches!(last_fade(&session), BackgroundFade::Flash { .. }));

    for _ in 0..50 {
        canvas.clear();
        session.tick(&mut canvas).unwrap();
    }
    assert!(last_fade(&session).is_plain());
}

#[test]
fn audio_notes_become_rings_for_twenty_ticks() {
    let rig = Rig::default();
    let mut session = rig.start(Genre::Neural).unwrap();
    let mut canvas = DrawRecorder::default();

    rig.events().note(NoteKind::Lead, 0.25, 0.75);
    let mut ticks_with_ring = 0;
    for _ in 0..30 {
        canvas.clear();
        session.tick(&mut canvas).unwrap();
        if canvas.rings().count() > 0 {
            ticks_with_ring += 1;
        }
    }
    assert_eq!(ticks_with_ring, 20);
    assert!(session.orchestrator().unwrap().overlay().notes().is_empty());
}

#[test]
fn hand_frames_reach_the_audio_engine() {
    let rig = Rig::default();
    let mut session = rig.start(Genre::Liquid).unwrap();
    let mut canvas = DrawRecorder::default();

    rig.sink().publish(&TrackerFrame { hands: vec![open_hand(Side::Left)] });
    session.tick(&mut canvas).unwrap();
    assert_eq!(*rig.updates.lock().unwrap(), vec![(Side::Left, true), (Side::Right, false)]);
    assert!(session.orchestrator().unwrap().hands().left.is_some());

    // Nothing new from the tracker: no audio update, snapshot kept.
    session.tick(&mut canvas).unwrap();
    assert_eq!(rig.updates.lock().unwrap().len(), 2);
    assert!(session.orchestrator().unwrap().hands().left.is_some());
}

#[test]
fn resize_reseeds_at_same_count() {
    let rig = Rig::default();
    let mut session = rig.start(Genre::Vortex).unwrap();
    let before = session.orchestrator().unwrap().system().len();
    session.resize(640.0, 360.0);
    let orch = session.orchestrator().unwrap();
    assert_eq!(orch.system().len(), before);
    assert_eq!(orch.size(), (640.0, 360.0));

    session.resize(0.0, 0.0);
    assert_eq!(session.orchestrator().unwrap().size(), (640.0, 360.0));
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[test]
fn start_order_is_tracker_subscribe_load() {
    let rig = Rig::default();
    let session = rig.start(Genre::Neural).unwrap();
    assert!(session.is_running());
    assert_eq!(rig.calls(), ["tracker.start", "audio.subscribe", "audio.load neural"]);
}

#[test]
fn stop_is_idempotent() {
    let rig = Rig::default();
    let mut session = rig.start(Genre::Liquid).unwrap();
    session.stop();
    session.stop();
    drop(session);
    assert_eq!(count(&rig.calls, "tracker.stop"), 1);
    assert_eq!(count(&rig.calls, "audio.stop"), 1);
}

#[test]
fn drop_stops_the_session() {
    let rig = Rig::default();
    drop(rig.start(Genre::Liquid).unwrap());
    assert_eq!(count(&rig.calls, "tracker.stop"), 1);
    assert_eq!(count(&rig.calls, "audio.stop"), 1);
}

#[test]
fn tick_after_stop_is_a_no_op() {
    let rig = Rig::default();
    let mut session = rig.start(Genre::Liquid).unwrap();
    session.stop();
    let mut canvas = DrawRecorder::default();
    assert!(session.tick(&mut canvas).is_ok());
    assert!(canvas.commands.is_empty());
    assert!(session.orchestrator().is_none());
}

#[test]
fn failed_audio_load_stops_the_tracker() {
    let rig = Rig { fail_load: true, ..Rig::default() };
    let err = rig.start(Genre::Vortex).err().unwrap();
    assert!(matches!(err, SessionError::Audio(AudioError::Load(_))));
    assert_eq!(
        rig.calls(),
        ["tracker.start", "audio.subscribe", "audio.load vortex", "tracker.stop", "audio.stop"]
    );
}

#[test]
fn failed_tracker_start_still_releases_the_tracker() {
    let rig = Rig { fail_start: true, ..Rig::default() };
    let err = rig.start(Genre::Liquid).err().unwrap();
    assert!(matches!(err, SessionError::Tracker(TrackerError::Unavailable(_))));
    assert_eq!(rig.calls(), ["tracker.start", "tracker.stop"]);
}

#[test]
fn failed_tracker_start_with_failing_stop_reports_the_start_error() {
    let rig = Rig { fail_start: true, fail_stop: true, ..Rig::default() };
    let err = rig.start(Genre::Neural).err().unwrap();
    assert!(matches!(err, SessionError::Tracker(TrackerError::Unavailable(_))));
    assert_eq!(rig.calls(), ["tracker.start", "tracker.stop"]);
}

#[test]
fn invalid_config_starts_nothing() {
    let rig = Rig::default();
    let mut config = EngineConfig::default();
    config.calibration.open_range = -1.0;
    let tracker = FakeTracker {
        calls: rig.calls.clone(),
        sink: rig.sink.clone(),
        fail_start: false,
        fail_stop: false,
    };
    let audio = FakeAudio {
        calls: rig.calls.clone(),
        events: rig.events.clone(),
        updates: rig.updates.clone(),
        fail_load: false,
    };
    let err = Session::start(&config, W, H, Box::new(tracker), Box::new(audio)).err().unwrap();
    assert!(matches!(err, SessionError::Config(_)));
    assert!(rig.calls().is_empty());
}

#[test]
fn tracker_runtime_error_is_fatal_at_next_tick() {
    let rig = Rig::default();
    let mut session = rig.start(Genre::Neural).unwrap();
    let mut canvas = DrawRecorder::default();
    session.tick(&mut canvas).unwrap();

    rig.sink().report_error(TrackerError::Runtime("stream ended".into()));
    let err = session.tick(&mut canvas).err().unwrap();
    assert!(matches!(err, SessionError::Tracker(TrackerError::Runtime(_))));
    assert!(!session.is_running());
    assert_eq!(count(&rig.calls, "tracker.stop"), 1);
}

#[test]
fn tracker_errors_after_stop_are_suppressed() {
    let rig = Rig { fail_stop: true, ..Rig::default() };
    let mut session = rig.start(Genre::Liquid).unwrap();
    let sink = rig.sink();
    session.stop();
    sink.report_error(TrackerError::Runtime("late".into()));
    sink.publish(&TrackerFrame { hands: vec![open_hand(Side::Right)] });
    let mut canvas = DrawRecorder::default();
    assert!(session.tick(&mut canvas).is_ok());
    assert!(rig.updates.lock().unwrap().is_empty());
}
