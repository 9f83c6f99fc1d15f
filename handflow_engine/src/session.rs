//! Session lifecycle and the collaborator seams.
//!
//! A [`Session`] owns a hand tracker, an audio engine and the render state.
//! The tracker and audio engine run on their own threads and only ever
//! write into the input bus; [`Session::tick`] drains it once per frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::canvas::Canvas;
use crate::config::EngineConfig;
use crate::error::{AudioError, SessionError, TrackerError};
use crate::genre::Genre;
use crate::hand::{map_frame, HandState, Side, SqueezeCalibration, TrackerFrame};
use crate::input::{AudioEventSender, HandSlot, InputBus};
use crate::orchestrator::FrameOrchestrator;

// ════════════════════════════════════════════════════════════════════════════
// Collaborator traits
// ════════════════════════════════════════════════════════════════════════════

/// A hand-landmark source: camera model, LeapMotion, simulation.
pub trait HandTracker {
    /// Begin delivering frames to `sink`.  Returns once capture is running.
    fn start(&mut self, sink: TrackerSink) -> Result<(), TrackerError>;
    /// Stop capture and release the device.
    fn stop(&mut self) -> Result<(), TrackerError>;
}

/// Genre audio: consumes hand values, produces beat and note events.
pub trait AudioEngine {
    fn load(&mut self, genre: Genre) -> Result<(), AudioError>;
    fn subscribe(&mut self, events: AudioEventSender);
    /// `vertical`/`horizontal` are the normalized hand coordinates; all
    /// values are zero when `present` is false.
    fn update(&mut self, side: Side, vertical: f32, horizontal: f32, present: bool, squeeze: f32);
    fn stop(&mut self);
}

// ════════════════════════════════════════════════════════════════════════════
// TrackerSink
// ════════════════════════════════════════════════════════════════════════════

/// The tracker's handle into a session.  Clone it into the capture thread.
#[derive(Clone, Debug)]
pub struct TrackerSink {
    slot:        HandSlot,
    calibration: SqueezeCalibration,
    error:       Arc<Mutex<Option<TrackerError>>>,
    detached:    Arc<AtomicBool>,
}

impl TrackerSink {
    pub fn new(slot: HandSlot, calibration: SqueezeCalibration) -> Self {
        TrackerSink {
            slot,
            calibration,
            error:    Arc::new(Mutex::new(None)),
            detached: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Map a raw result and make it the pending hand state.
    pub fn publish(&self, frame: &TrackerFrame) {
        if self.is_detached() {
            return;
        }
        self.slot.publish(map_frame(frame, &self.calibration));
    }

    /// Surface a runtime failure.  The first one sticks; anything reported
    /// after [`detach`](Self::detach) is dropped.
    pub fn report_error(&self, error: TrackerError) {
        if self.is_detached() {
            log::debug!("tracker error after detach ignored: {}", error);
            return;
        }
        if let Ok(mut slot) = self.error.lock() {
            slot.get_or_insert(error);
        }
    }

    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    pub fn take_error(&self) -> Option<TrackerError> {
        self.error.lock().ok().and_then(|mut e| e.take())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

pub struct Session {
    tracker:      Box<dyn HandTracker>,
    audio:        Box<dyn AudioEngine>,
    bus:          InputBus,
    sink:         TrackerSink,
    orchestrator: Option<FrameOrchestrator>,
    running:      bool,
}

impl Session {
    /// Start the tracker, subscribe to audio events and load the genre,
    /// in that order.  On any failure the tracker is stopped (even when its
    /// own start is what failed) before the error is returned.
    pub fn start(
        config:  &EngineConfig,
        width:   f32,
        height:  f32,
        tracker: Box<dyn HandTracker>,
        audio:   Box<dyn AudioEngine>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        check_surface(width, height)?;

        let bus = InputBus::new();
        let sink = TrackerSink::new(bus.hand_slot(), config.calibration);
        let mut session = Session { tracker, audio, bus, sink, orchestrator: None, running: false };

        if let Err(e) = session.tracker.start(session.sink.clone()) {
            // A tracker can fail after it has already opened its device.
            session.sink.detach();
            if let Err(stop_err) = session.tracker.stop() {
                log::debug!("tracker stop after failed start: {}", stop_err);
            }
            return Err(e.into());
        }
        session.running = true;

        session.audio.subscribe(session.bus.audio_sender());
        if let Err(e) = session.audio.load(config.genre) {
            log::warn!("audio load failed, stopping tracker: {}", e);
            session.stop();
            return Err(e.into());
        }

        session.orchestrator = Some(FrameOrchestrator::new(config.genre, width, height));
        log::info!("session started: genre {} at {}x{}", config.genre, width, height);
        Ok(session)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn orchestrator(&self) -> Option<&FrameOrchestrator> {
        self.orchestrator.as_ref()
    }

    /// One frame.  A tracker runtime error reported since the last tick
    /// ends the session and is returned.  After `stop` this is a no-op.
    pub fn tick(&mut self, canvas: &mut dyn Canvas) -> Result<(), SessionError> {
        if !self.running {
            return Ok(());
        }
        if let Some(e) = self.sink.take_error() {
            log::error!("{}", e);
            self.stop();
            return Err(e.into());
        }

        let input = self.bus.drain();
        if let Some(state) = &input.hands {
            forward_to_audio(self.audio.as_mut(), state);
        }
        if let Some(orch) = self.orchestrator.as_mut() {
            orch.tick(input, canvas);
        }
        Ok(())
    }

    /// Rebuild the population for a new surface.  Degenerate sizes are
    /// ignored (minimized windows report 0×0).
    pub fn resize(&mut self, width: f32, height: f32) {
        if check_surface(width, height).is_err() {
            log::debug!("ignoring resize to {}x{}", width, height);
            return;
        }
        if let Some(orch) = self.orchestrator.as_mut() {
            orch.resize(width, height);
            log::info!("surface resized to {}x{}", width, height);
        }
    }

    /// Tear down.  Safe to call more than once.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.sink.detach();
        if let Err(e) = self.tracker.stop() {
            log::debug!("tracker stop: {}", e);
        }
        self.audio.stop();
        self.orchestrator = None;
        log::info!("session stopped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

fn check_surface(width: f32, height: f32) -> Result<(), SessionError> {
    let ok = width.is_finite() && height.is_finite() && width >= 1.0 && height >= 1.0;
    if ok {
        Ok(())
    } else {
        Err(SessionError::Config(format!("drawing surface must be at least 1x1 (got {}x{})", width, height)))
    }
}

fn forward_to_audio(audio: &mut dyn AudioEngine, state: &HandState) {
    for side in Side::BOTH {
        match state.hand(side) {
            Some(c) => audio.update(side, c.y, c.x, true, state.squeeze(side)),
            None => audio.update(side, 0.0, 0.0, false, 0.0),
        }
    }
}
