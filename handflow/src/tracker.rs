//! Hand trackers: a mouse/keyboard simulation and LeapMotion hardware.
//!
//! Both run on their own thread and deliver [`TrackerFrame`]s through the
//! session's [`TrackerSink`].  The session never needs to know which one
//! is feeding it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use handflow_engine::hand::{DetectedHand, Landmark, Side, TrackerFrame, FINGERTIPS, INDEX_TIP, LANDMARK_COUNT};
use handflow_engine::{HandTracker, TrackerError, TrackerSink};

/// How often an idle capture thread checks whether it should exit.
const IDLE_POLL: Duration = Duration::from_millis(50);

// ════════════════════════════════════════════════════════════════════════════
// SimInput: what the window hands the simulator each refresh
// ════════════════════════════════════════════════════════════════════════════

/// One simulated hand, in screen-normalized coordinates (`0,0` top-left).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimHand {
    pub x:      f32,
    pub y:      f32,
    pub closed: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimInput {
    pub left:  Option<SimHand>,
    pub right: Option<SimHand>,
}

impl SimInput {
    pub fn to_frame(&self) -> TrackerFrame {
        let hands = [(Side::Left, self.left), (Side::Right, self.right)]
            .into_iter()
            .filter_map(|(side, hand)| hand.map(|h| DetectedHand { side, landmarks: synth_landmarks(&h) }))
            .collect();
        TrackerFrame { hands }
    }
}

/// Wrist→fingertip distance for an open and for a closed simulated hand.
const OPEN_SPREAD:   f32 = 0.42;
const CLOSED_SPREAD: f32 = 0.08;

/// Build a 21-point landmark set whose index fingertip lands under
/// `(hand.x, hand.y)` on screen and whose fingertip spread reads as open or
/// closed.  Image x is pre-mirrored so the mapper's mirror cancels out.
pub fn synth_landmarks(hand: &SimHand) -> Vec<Landmark> {
    let spread = if hand.closed { CLOSED_SPREAD } else { OPEN_SPREAD };
    let tip = Landmark::new(1.0 - hand.x, hand.y, 0.0);
    let wrist = Landmark::new(tip.x, tip.y + spread, 0.0);

    let mut landmarks = vec![wrist; LANDMARK_COUNT];
    for (i, &finger) in FINGERTIPS.iter().enumerate() {
        if finger == INDEX_TIP {
            landmarks[finger] = tip;
            continue;
        }
        let angle = 0.25 * i as f32;
        landmarks[finger] = Landmark::new(
            wrist.x + spread * angle.sin(),
            wrist.y - spread * angle.cos(),
            0.0,
        );
    }
    landmarks
}

// ════════════════════════════════════════════════════════════════════════════
// SimTracker
// ════════════════════════════════════════════════════════════════════════════

/// The window's end of the simulator.
#[derive(Clone, Debug)]
pub struct SimFeed {
    tx: Sender<SimInput>,
}

impl SimFeed {
    pub fn send(&self, input: SimInput) {
        let _ = self.tx.send(input);
    }
}

pub struct SimTracker {
    rx:      Option<Receiver<SimInput>>,
    running: Arc<AtomicBool>,
    handle:  Option<JoinHandle<()>>,
}

impl SimTracker {
    pub fn new() -> (Self, SimFeed) {
        let (tx, rx) = mpsc::channel();
        let tracker = SimTracker {
            rx:      Some(rx),
            running: Arc::new(AtomicBool::new(false)),
            handle:  None,
        };
        (tracker, SimFeed { tx })
    }
}

impl HandTracker for SimTracker {
    fn start(&mut self, sink: TrackerSink) -> Result<(), TrackerError> {
        let rx = self
            .rx
            .take()
            .ok_or_else(|| TrackerError::Unavailable("simulated tracker already started".into()))?;
        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        let handle = thread::Builder::new()
            .name("handflow-sim".into())
            .spawn(move || sim_thread(rx, sink, running))
            .map_err(|e| TrackerError::Unavailable(format!("cannot spawn simulator: {}", e)))?;
        self.handle = Some(handle);
        log::info!("tracker: mouse/keyboard simulation");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TrackerError> {
        self.running.store(false, Ordering::SeqCst);
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| TrackerError::Runtime("simulator thread panicked".into())),
            None => Ok(()),
        }
    }
}

fn sim_thread(rx: Receiver<SimInput>, sink: TrackerSink, running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) && !sink.is_detached() {
        match rx.recv_timeout(IDLE_POLL) {
            Ok(input) => sink.publish(&input.to_frame()),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                sink.report_error(TrackerError::Runtime("simulation input closed".into()));
                break;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapTracker: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Tracker backed by a LeapMotion controller via LeapC.
///
/// Palm positions (mm) are normalized over the interaction box below;
/// finger geometry is scaled separately so a relaxed open hand reads as
/// fully open under the default squeeze calibration.
#[cfg(feature = "leap")]
pub struct LeapTracker {
    running: Arc<AtomicBool>,
    handle:  Option<JoinHandle<()>>,
}

#[cfg(feature = "leap")]
mod leap {
    /// Half-width of the tracked volume along x, mm.
    pub const HALF_SPAN_X: f32 = 200.0;
    /// Lowest and highest tracked palm heights, mm.
    pub const MIN_Y:       f32 = 100.0;
    pub const SPAN_Y:      f32 = 400.0;
    /// Millimetres of finger reach per normalized unit.
    pub const HAND_SCALE:  f32 = 200.0;
}

#[cfg(feature = "leap")]
impl LeapTracker {
    pub fn new() -> Self {
        LeapTracker { running: Arc::new(AtomicBool::new(false)), handle: None }
    }
}

#[cfg(feature = "leap")]
impl HandTracker for LeapTracker {
    fn start(&mut self, sink: TrackerSink) -> Result<(), TrackerError> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), TrackerError>>(1);
        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        let handle = thread::Builder::new()
            .name("handflow-leap".into())
            .spawn(move || leap_thread(sink, running, ready_tx))
            .map_err(|e| TrackerError::Unavailable(format!("cannot spawn leap thread: {}", e)))?;

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(TrackerError::Unavailable("leap thread exited during startup".into())));
        match ready {
            Ok(()) => {
                self.handle = Some(handle);
                log::info!("tracker: LeapMotion");
                Ok(())
            }
            Err(e) => {
                let _ = handle.join();
                Err(e)
            }
        }
    }

    fn stop(&mut self) -> Result<(), TrackerError> {
        self.running.store(false, Ordering::SeqCst);
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| TrackerError::Runtime("leap thread panicked".into())),
            None => Ok(()),
        }
    }
}

#[cfg(feature = "leap")]
fn leap_thread(
    sink:     TrackerSink,
    running:  Arc<AtomicBool>,
    ready_tx: mpsc::SyncSender<Result<(), TrackerError>>,
) {
    use leaprs::*;

    let mut connection = match Connection::create(ConnectionConfig::default()) {
        Ok(c) => c,
        Err(e) => {
            let _ = ready_tx.send(Err(TrackerError::Unavailable(format!("LeapC connection: {:?}", e))));
            return;
        }
    };
    if let Err(e) = connection.open() {
        let _ = ready_tx.send(Err(TrackerError::Unavailable(format!("LeapMotion device: {:?}", e))));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    while running.load(Ordering::SeqCst) && !sink.is_detached() {
        let msg = match connection.poll(100) {
            Ok(m) => m,
            Err(_) => continue,
        };
        if let Event::Tracking(frame) = msg.event() {
            let hands = frame
                .hands()
                .map(|hand| {
                    let side = if hand.hand_type() == HandType::Left { Side::Left } else { Side::Right };
                    let p = hand.palm().position();
                    let tips: Vec<(f32, f32)> = hand
                        .digits()
                        .map(|d| {
                            let t = d.distal().next_joint();
                            (t.x - p.x, t.y - p.y)
                        })
                        .collect();
                    DetectedHand { side, landmarks: leap_landmarks((p.x, p.y), &tips) }
                })
                .collect();
            sink.publish(&TrackerFrame { hands });
        }
    }
}

/// Palm position and palm-relative digit tips (thumb first, mm) to a
/// landmark set.  Leap y grows upward; image y grows downward.
#[cfg(feature = "leap")]
fn leap_landmarks(palm: (f32, f32), tips: &[(f32, f32)]) -> Vec<Landmark> {
    let wrist = Landmark::new(
        1.0 - (palm.0 + leap::HALF_SPAN_X) / (2.0 * leap::HALF_SPAN_X),
        1.0 - (palm.1 - leap::MIN_Y) / leap::SPAN_Y,
        0.0,
    );
    let mut landmarks = vec![wrist; LANDMARK_COUNT];
    // Digits come thumb, index, middle, ring, pinky.
    for (tip, &(dx, dy)) in [4usize, 8, 12, 16, 20].iter().zip(tips) {
        landmarks[*tip] = Landmark::new(
            wrist.x - dx / leap::HAND_SCALE,
            wrist.y - dy / leap::HAND_SCALE,
            0.0,
        );
    }
    landmarks
}
