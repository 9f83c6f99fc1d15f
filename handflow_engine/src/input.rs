//! Frame-input bus between the asynchronous producers and the render tick.
//!
//! ```text
//!  tracker thread ──publish──► HandSlot (latest value) ─┐
//!                                                       ├─► drain() ─► FrameInput ─► tick
//!  audio thread ───beat/note─► bounded event queue ─────┘
//! ```
//!
//! Producers never block: the hand slot is overwritten, and events that do
//! not fit in the queue are dropped.  The tick drains both exactly once.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};

use crate::hand::HandState;

pub const EVENT_QUEUE_CAPACITY: usize = 256;

// ════════════════════════════════════════════════════════════════════════════
// Audio events
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeatKind {
    Kick,
    Snare,
    HiHat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteKind {
    Lead,
    Bass,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AudioEvent {
    Beat(BeatKind),
    /// `x`, `y` normalized surface position of the burst.
    Note { kind: NoteKind, x: f32, y: f32 },
}

/// Producer half handed to the audio engine.  Cheap to clone, `Send`.
#[derive(Clone, Debug)]
pub struct AudioEventSender {
    tx: SyncSender<AudioEvent>,
}

impl AudioEventSender {
    pub fn beat(&self, kind: BeatKind) {
        self.send(AudioEvent::Beat(kind));
    }

    pub fn note(&self, kind: NoteKind, x: f32, y: f32) {
        self.send(AudioEvent::Note { kind, x, y });
    }

    pub fn send(&self, event: AudioEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(e)) => log::trace!("event queue full, dropped {:?}", e),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandSlot
// ════════════════════════════════════════════════════════════════════════════

/// Latest-value cell for the mapped hand state.
#[derive(Clone, Debug, Default)]
pub struct HandSlot {
    cell: Arc<Mutex<Option<HandState>>>,
}

impl HandSlot {
    /// Replace whatever is pending with `state`.
    pub fn publish(&self, state: HandState) {
        if let Ok(mut cell) = self.cell.lock() {
            *cell = Some(state);
        }
    }

    /// Take the pending state, if any.  A poisoned lock reads as "nothing new".
    pub fn take(&self) -> Option<HandState> {
        self.cell.lock().ok().and_then(|mut cell| cell.take())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameInput + InputBus
// ════════════════════════════════════════════════════════════════════════════

/// Everything that arrived since the previous tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// `None` when the tracker reported nothing new; keep the last snapshot.
    pub hands: Option<HandState>,
    pub beat:  bool,
    /// Normalized positions of notes triggered since the last tick.
    pub notes: Vec<(f32, f32)>,
}

pub struct InputBus {
    slot:      HandSlot,
    events_tx: AudioEventSender,
    events_rx: Receiver<AudioEvent>,
}

impl InputBus {
    pub fn new() -> Self {
        let (tx, events_rx) = mpsc::sync_channel(EVENT_QUEUE_CAPACITY);
        InputBus {
            slot: HandSlot::default(),
            events_tx: AudioEventSender { tx },
            events_rx,
        }
    }

    pub fn hand_slot(&self) -> HandSlot { self.slot.clone() }
    pub fn audio_sender(&self) -> AudioEventSender { self.events_tx.clone() }

    /// Non-blocking: collect everything pending into one [`FrameInput`].
    pub fn drain(&self) -> FrameInput {
        let mut input = FrameInput { hands: self.slot.take(), ..FrameInput::default() };
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AudioEvent::Beat(_) => input.beat = true,
                AudioEvent::Note { x, y, .. } => input.notes.push((x, y)),
            }
        }
        input
    }
}

impl Default for InputBus {
    fn default() -> Self {
        Self::new()
    }
}
